use crate::api::error::EngineError;
use crate::api::types::EntityId;
use crate::components::entity::Entity;
use crate::components::hitbox::{CollisionDirection, Hitbox, TieBreak};
use crate::components::level::TileLookup;
use crate::core::context::{Commands, TickContext};
use crate::core::timer::Timer;
use crate::input::state::InputState;

/// Two entities whose hitboxes overlapped this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: EntityId,
    pub b: EntityId,
    /// Side of `b` that `a` hit, or `None` when ambiguous.
    pub direction: Option<CollisionDirection>,
}

/// Simple entity storage using a flat Vec.
/// Designed for small-to-medium entity counts (hundreds, not millions).
/// Iteration order is spawn order.
pub struct Scene {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a scene with a specific entity capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            next_id: 1,
        }
    }

    /// Add an entity, assigning it a fresh id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.entities.push(entity);
        id
    }

    /// Remove an entity by ID. Returns the removed entity if found.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    /// Find the first entity with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.tag == tag)
    }

    pub fn find_by_tag_mut(&mut self, tag: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.tag == tag)
    }

    pub fn find_all_by_tag(&self, tag: &str) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.tag == tag).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Update every entity in spawn order.
    ///
    /// A failing entity is logged and reported; the rest of the scene still
    /// updates.
    pub fn update(
        &mut self,
        dt: f32,
        input: &InputState,
        level: &dyn TileLookup,
        timer: &mut Timer,
        commands: &mut Commands,
    ) -> Vec<(EntityId, EngineError)> {
        let mut errors = Vec::new();
        for entity in self.entities.iter_mut() {
            let mut ctx = TickContext::new(entity.id, input, level, timer, commands);
            if let Err(err) = entity.update(dt, &mut ctx) {
                log::error!("entity {:?} ({}): {}", entity.id, entity.tag, err);
                errors.push((entity.id, err));
            }
        }
        errors
    }

    /// Push every live solid entity out of the static obstacles it overlaps.
    ///
    /// Velocity into the resolved face is zeroed so gravity does not keep
    /// accumulating against the floor. Returns how many contacts were resolved.
    pub fn resolve_solids(&mut self, solids: &[Hitbox], tie_break: TieBreak) -> usize {
        let mut resolved = 0;
        for entity in self.entities.iter_mut() {
            let body = &mut entity.body;
            if !body.solid || body.is_dead() || body.clean_up {
                continue;
            }
            for obstacle in solids {
                let Some(direction) = body.resolve_against(obstacle, tie_break) else {
                    continue;
                };
                match direction {
                    CollisionDirection::Bottom => body.velocity.y = body.velocity.y.min(0.0),
                    CollisionDirection::Top => body.velocity.y = body.velocity.y.max(0.0),
                    CollisionDirection::Right => body.velocity.x = body.velocity.x.min(0.0),
                    CollisionDirection::Left => body.velocity.x = body.velocity.x.max(0.0),
                }
                resolved += 1;
            }
        }
        resolved
    }

    /// Test every pair of entities once and append the overlapping ones.
    /// Dead hitboxes are frozen (usually zeroed) and so rarely appear here.
    pub fn collisions_into(&self, tie_break: TieBreak, out: &mut Vec<CollisionPair>) {
        for (i, a) in self.entities.iter().enumerate() {
            if a.body.clean_up {
                continue;
            }
            for b in &self.entities[i + 1..] {
                if b.body.clean_up || !a.body.hitbox.overlaps(&b.body.hitbox) {
                    continue;
                }
                out.push(CollisionPair {
                    a: a.id,
                    b: b.id,
                    direction: a.body.hitbox.collision_direction_with(&b.body.hitbox, tie_break),
                });
            }
        }
    }

    pub fn collisions(&self, tie_break: TieBreak) -> Vec<CollisionPair> {
        let mut out = Vec::new();
        self.collisions_into(tie_break, &mut out);
        out
    }

    /// Remove entities whose death sequence has finished. Returns their ids.
    pub fn evict_cleaned_up(&mut self) -> Vec<EntityId> {
        let evicted: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.body.clean_up)
            .map(|e| e.id)
            .collect();
        if !evicted.is_empty() {
            log::debug!("evicting {} entities: {:?}", evicted.len(), evicted);
            self.entities.retain(|e| !e.body.clean_up);
        }
        evicted
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::{AnimationDef, AnimationSet};
    use crate::components::entity::Body;
    use crate::components::level::Level;
    use crate::core::fsm::StateParams;
    use crate::core::states::Dying;
    use glam::Vec2;

    fn boxy(x: f32, y: f32) -> Entity {
        Entity::new(Body::new(Vec2::new(x, y), Vec2::new(10.0, 10.0)))
    }

    #[test]
    fn spawn_assigns_ids_and_get() {
        let mut scene = Scene::new();
        let a = scene.spawn(boxy(10.0, 20.0));
        let b = scene.spawn(boxy(0.0, 0.0));
        assert_eq!(a, EntityId(1));
        assert_eq!(b, EntityId(2));
        assert_eq!(scene.get(a).unwrap().body.position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn despawn_removes_entity() {
        let mut scene = Scene::new();
        let id = scene.spawn(boxy(0.0, 0.0));
        assert_eq!(scene.len(), 1);
        assert!(scene.despawn(id).is_some());
        assert!(scene.despawn(id).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn find_by_tag() {
        let mut scene = Scene::new();
        scene.spawn(boxy(0.0, 0.0).with_tag("hero"));
        let enemy = scene.spawn(boxy(0.0, 0.0).with_tag("enemy"));
        assert_eq!(scene.find_by_tag("enemy").unwrap().id, enemy);
        assert_eq!(scene.find_all_by_tag("hero").len(), 1);
    }

    #[test]
    fn pairwise_collisions_report_each_pair_once() {
        let mut scene = Scene::new();
        let a = scene.spawn(boxy(0.0, 0.0));
        let b = scene.spawn(boxy(5.0, 0.0));
        scene.spawn(boxy(100.0, 100.0));

        let pairs = scene.collisions(TieBreak::Skip);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].a, a);
        assert_eq!(pairs[0].b, b);
        assert_eq!(pairs[0].direction, Some(CollisionDirection::Right));
    }

    #[test]
    fn solids_stop_a_falling_body() {
        let mut scene = Scene::new();
        let id = scene.spawn(boxy(4.0, 0.0));
        let floor = [Hitbox::new(0.0, 8.0, 64.0, 16.0)];
        scene.get_mut(id).unwrap().body.velocity = Vec2::new(0.0, 200.0);

        assert_eq!(scene.resolve_solids(&floor, TieBreak::Skip), 1);
        let body = &scene.get(id).unwrap().body;
        assert_eq!(body.hitbox.bottom(), 8.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn non_solid_bodies_pass_through() {
        let mut scene = Scene::new();
        let ghost = Entity::new(Body::new(Vec2::new(4.0, 0.0), Vec2::new(10.0, 10.0)).non_solid());
        let id = scene.spawn(ghost);
        let floor = [Hitbox::new(0.0, 8.0, 64.0, 16.0)];
        assert_eq!(scene.resolve_solids(&floor, TieBreak::Skip), 0);
        assert_eq!(scene.get(id).unwrap().body.position, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn failing_entity_does_not_stop_the_rest() {
        let mut scene = Scene::new();
        let broken = scene.spawn(boxy(0.0, 0.0).starting_in("missing", StateParams::new()));
        let fine = scene.spawn(boxy(0.0, 0.0));
        scene.get_mut(fine).unwrap().body.velocity = Vec2::new(1.0, 0.0);

        let (input, level) = (InputState::new(), Level::empty());
        let (mut timer, mut commands) = (Timer::new(), Commands::new());
        let errors = scene.update(1.0, &input, &level, &mut timer, &mut commands);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, broken);
        assert_eq!(scene.get(fine).unwrap().body.position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn death_animation_finishes_before_eviction() {
        let mut scene = Scene::new();
        let animations = AnimationSet::new().with("die", AnimationDef::new(vec![0, 1, 2], 0.1).once());
        let body = Body::new(Vec2::ZERO, Vec2::new(10.0, 10.0)).with_animations(animations);
        let id = scene.spawn(Entity::new(body).with_state("dying", Dying::new("die")));

        let (input, level) = (InputState::new(), Level::empty());
        let (mut timer, mut commands) = (Timer::new(), Commands::new());
        {
            let entity = scene.get_mut(id).unwrap();
            entity.body.kill();
            let mut ctx = TickContext::new(id, &input, &level, &mut timer, &mut commands);
            entity.change_state("dying", &StateParams::new(), &mut ctx).unwrap();
        }
        assert!(scene.get(id).unwrap().body.hitbox.is_degenerate());

        let mut ticks = 0;
        while scene.get(id).is_some() {
            scene.update(0.05, &input, &level, &mut timer, &mut commands);
            scene.evict_cleaned_up();
            ticks += 1;
            assert!(ticks < 100, "dying entity never cleaned up");
        }
        // Three frames at 0.1s each, ticked at 0.05s.
        assert!(ticks >= 6);
    }
}
