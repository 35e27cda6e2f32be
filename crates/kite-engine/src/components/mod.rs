pub mod animation;
pub mod entity;
pub mod hitbox;
pub mod level;
