pub mod context;
pub mod fsm;
pub mod scene;
pub mod states;
pub mod time;
pub mod timer;
