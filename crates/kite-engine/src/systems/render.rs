use crate::components::hitbox::Hitbox;
use crate::core::scene::Scene;
use crate::renderer::camera::Camera;
use crate::renderer::instance::{RenderBuffer, RenderInstance};

/// Build the render buffer from the scene, in spawn order.
///
/// One instance per entity (sprite box, current animation frame, facing),
/// followed by whatever the entity's current state pushes. Entities outside
/// `camera`'s visible area are culled. With `debug` set, every non-empty
/// hitbox is also listed for the overlay.
pub fn build_render_buffer(scene: &Scene, camera: Option<&Camera>, buffer: &mut RenderBuffer, debug: bool) {
    buffer.clear();

    for entity in scene.iter() {
        let body = &entity.body;
        if body.clean_up {
            continue;
        }

        let bounds = Hitbox::new(body.position.x, body.position.y, body.dimensions.x, body.dimensions.y);
        if let Some(camera) = camera {
            if !camera.is_visible(&bounds) && !camera.is_visible(&body.hitbox) {
                continue;
            }
        }

        buffer.push(RenderInstance {
            x: body.position.x,
            y: body.position.y,
            width: body.dimensions.x,
            height: body.dimensions.y,
            frame: body.animations.current_frame() as f32,
            direction: body.direction.sign(),
            alpha: 1.0,
            entity: entity.id.0 as f32,
        });
        entity.render(buffer);

        if debug && !body.hitbox.is_degenerate() {
            buffer.push_debug(body.hitbox);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Direction;
    use crate::components::animation::{AnimationDef, AnimationSet};
    use crate::components::entity::{Body, Entity};
    use crate::renderer::camera::CameraConfig;
    use glam::Vec2;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        let animations = AnimationSet::new().with("run", AnimationDef::new(vec![4, 5, 6], 0.1));
        let mut body = Body::new(Vec2::new(10.0, 20.0), Vec2::new(16.0, 24.0)).with_animations(animations);
        body.animations.play("run");
        body.direction = Direction::Left;
        scene.spawn(Entity::new(body));
        scene.spawn(Entity::new(Body::new(Vec2::new(5000.0, 0.0), Vec2::new(8.0, 8.0))));
        scene
    }

    #[test]
    fn instance_carries_body_data() {
        let mut buffer = RenderBuffer::new();
        build_render_buffer(&scene(), None, &mut buffer, false);

        assert_eq!(buffer.instance_count(), 2);
        let first = buffer.instances[0];
        assert_eq!((first.x, first.y), (10.0, 20.0));
        assert_eq!((first.width, first.height), (16.0, 24.0));
        assert_eq!(first.frame, 4.0);
        assert_eq!(first.direction, -1.0);
        assert_eq!(first.entity, 1.0);
        assert!(buffer.debug_boxes.is_empty());
    }

    #[test]
    fn camera_culls_and_debug_lists_hitboxes() {
        let camera = Camera::new(CameraConfig::default()).with_scene(Vec2::new(10_000.0, 1000.0));
        let mut buffer = RenderBuffer::new();
        build_render_buffer(&scene(), Some(&camera), &mut buffer, true);

        assert_eq!(buffer.instance_count(), 1);
        assert_eq!(buffer.debug_boxes.len(), 1);
    }

    #[test]
    fn cleaned_up_entities_are_skipped() {
        let mut scene = scene();
        for entity in scene.iter_mut() {
            entity.body.clean_up = true;
        }
        let mut buffer = RenderBuffer::new();
        build_render_buffer(&scene, None, &mut buffer, true);
        assert_eq!(buffer.instance_count(), 0);
    }
}
