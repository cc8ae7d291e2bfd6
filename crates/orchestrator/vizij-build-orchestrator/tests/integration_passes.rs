use std::cell::RefCell;
use std::rc::Rc;

use vizij_build::{BuildConfig, BuildContext, FeatureOrder, FnPass, Pipeline};
use vizij_controller_core::masks::gesture_base_mask;
use vizij_controller_core::scale_fix::SCALE_LAYER_NAME;
use vizij_controller_core::scene::{
    MemoryMaterials, MemoryScene, PropertyValue, SceneComponent, SceneObject,
};
use vizij_controller_core::{
    BehaviourKind, BlendableLayer, BuildError, Clip, ComponentType, Controller, ControllerGraph,
    ControllerKind, Curve, CurveBinding, IdAllocator, Layer, LayerControl, BASE_PLACEHOLDER_NAME,
};

fn names(c: &Controller) -> Vec<&str> {
    c.layers().iter().map(|l| l.name.as_str()).collect()
}

fn layer_controls(layer: &Layer) -> Vec<(BlendableLayer, i32)> {
    layer
        .behaviours()
        .filter_map(|b| b.as_layer_control().map(|c| (c.playable, c.layer)))
        .collect()
}

/// FX: "Hat" drives "Glow" (index 1) through a layer control.
fn host_graph() -> ControllerGraph {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    let fx = graph.controller_or_insert(ControllerKind::Fx);
    let control = ids.alloc_behaviour();
    fx.new_layer("Hat", &mut ids).new_state("Idle").add_behaviour(
        control,
        BehaviourKind::LayerControl(LayerControl {
            playable: BlendableLayer::Fx,
            layer: 1,
            goal_weight: 1.0,
            blend_duration: 0.0,
            debug_label: "glow".into(),
        }),
    );
    fx.new_layer("Glow", &mut ids).new_state("On");
    graph
}

#[test]
fn feature_layers_shift_host_references() {
    let mut pipeline = Pipeline::default().with_pass(FnPass::new(
        "Intro Feature",
        FeatureOrder::Default,
        |cx: &mut BuildContext<'_>| {
            let mut intro = Layer::new("Intro", &mut cx.ids);
            intro.new_state("Play");
            cx.graph.controller_or_insert(ControllerKind::Fx).insert_layer(0, intro);
            cx.new_layer(ControllerKind::Fx, "Wings").new_state("Flap");
            Ok(())
        },
    ));

    let out = pipeline
        .run(host_graph(), &mut MemoryScene::new(), &mut MemoryMaterials::new())
        .expect("build");

    let fx = out.graph.controller(ControllerKind::Fx).unwrap();
    assert_eq!(names(fx), vec![BASE_PLACEHOLDER_NAME, "Intro", "Hat", "Glow", "Wings"]);
    assert_eq!(layer_controls(&fx.layers()[2]), vec![(BlendableLayer::Fx, 3)]);

    // No gesture layers to merge, but the gesture base mask is still fixed up.
    assert!(out.report.merge.is_none());
    let gesture = out.graph.controller(ControllerKind::Gesture).unwrap();
    assert_eq!(gesture.layers()[0].mask, Some(gesture_base_mask()));

    assert_eq!(out.report.recorded_references, 1);
    assert_eq!(out.report.resting.len(), 3);
    let reindex = out.report.reindex.expect("reindex ran");
    assert_eq!(reindex.rewritten, 1);
    assert!(out.report.timings_ms.contains_key("total_ms"));
    assert!(out.report.timings_ms.contains_key("layer_control_fix_ms"));
}

#[test]
fn second_base_author_fails_the_conflict_check() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    graph
        .controller_or_insert(ControllerKind::Base)
        .new_layer("Locomotion", &mut ids)
        .new_state("Stand");

    let mut pipeline = Pipeline::default().with_pass(FnPass::new(
        "GoGo Loco",
        FeatureOrder::Default,
        |cx: &mut BuildContext<'_>| {
            cx.new_layer(ControllerKind::Base, "GoGo").new_state("Stand");
            Ok(())
        },
    ));
    let err = pipeline
        .run(graph, &mut MemoryScene::new(), &mut MemoryMaterials::new())
        .unwrap_err();

    let chain = format!("{err:#}");
    assert!(chain.contains("pass controller_conflict_check (Controller Conflict Check)"), "{chain}");
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::MultipleOwners {
            kind: ControllerKind::Base,
            owners: vec!["Base Avatar".into(), "GoGo Loco".into()],
        })
    );
}

#[test]
fn layers_added_through_the_graph_belong_to_their_feature() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    graph
        .controller_or_insert(ControllerKind::Base)
        .new_layer("Locomotion", &mut ids)
        .new_state("Stand");

    let mut pipeline = Pipeline::default().with_pass(FnPass::new(
        "GoGo Loco",
        FeatureOrder::Default,
        |cx: &mut BuildContext<'_>| {
            cx.graph
                .controller_or_insert(ControllerKind::Base)
                .new_layer("GoGo", &mut cx.ids)
                .new_state("Stand");
            Ok(())
        },
    ));
    let err = pipeline
        .run(graph, &mut MemoryScene::new(), &mut MemoryMaterials::new())
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<BuildError>(),
        Some(&BuildError::MultipleOwners {
            kind: ControllerKind::Base,
            owners: vec!["Base Avatar".into(), "GoGo Loco".into()],
        })
    );
}

#[test]
fn early_features_do_not_claim_host_layers() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    graph
        .controller_or_insert(ControllerKind::Base)
        .new_layer("Locomotion", &mut ids)
        .new_state("Stand");

    // Runs ahead of the built-ins in the first slot and adds nothing.
    let mut pipeline = Pipeline::new(BuildConfig::default())
        .with_pass(FnPass::new(
            "Early Bird",
            FeatureOrder::RecordLayerControls,
            |_: &mut BuildContext<'_>| Ok(()),
        ))
        .with_builtin_passes()
        .with_pass(FnPass::new(
            "Base Avatar",
            FeatureOrder::Default,
            |cx: &mut BuildContext<'_>| {
                cx.new_layer(ControllerKind::Base, "Sit").new_state("Idle");
                Ok(())
            },
        ));
    let out = pipeline
        .run(graph, &mut MemoryScene::new(), &mut MemoryMaterials::new())
        .expect("one Base owner");
    let base = out.graph.controller(ControllerKind::Base).unwrap();
    assert_eq!(names(base), vec!["Locomotion", "Sit"]);
}

fn chest_scene() -> MemoryScene {
    MemoryScene::new().with_object(
        "Hips/Chest",
        SceneObject {
            local_scale_z: 1.0,
            components: vec![SceneComponent::new(ComponentType::Transform)
                .with_property("localScale.z", PropertyValue::Float(1.0))],
        },
    )
}

fn queue_chest(value: f32) -> impl FnMut(&mut BuildContext<'_>) -> anyhow::Result<()> {
    move |cx: &mut BuildContext<'_>| {
        let clip = Clip::new("chest").with_curve(
            CurveBinding::new("Hips/Chest", ComponentType::Transform, "localScale.z"),
            Curve::constant(value),
        );
        cx.queue_resting_clip(&clip);
        Ok(())
    }
}

#[test]
fn resting_conflict_between_features_aborts_the_build() {
    let mut pipeline = Pipeline::default()
        .with_pass(FnPass::new("A", FeatureOrder::Default, queue_chest(1.0)))
        .with_pass(FnPass::new("B", FeatureOrder::Default, queue_chest(2.0)));
    let err = pipeline
        .run(host_graph(), &mut chest_scene(), &mut MemoryMaterials::new())
        .unwrap_err();

    assert!(format!("{err:#}").contains("pass apply_rest_state_2"));
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::RestingConflict {
            first_owner,
            second_owner,
            ..
        }) => assert_eq!((first_owner.as_str(), second_owner.as_str()), ("A", "B")),
        other => panic!("expected a resting conflict, got {other:?}"),
    }
}

#[test]
fn later_phases_may_overwrite_earlier_ones() {
    let mut scene = chest_scene();
    let mut pipeline = Pipeline::default()
        .with_pass(FnPass::new("Early", FeatureOrder::ForceObjectState, queue_chest(2.0)))
        .with_pass(FnPass::new("Late", FeatureOrder::TogglesRestPose, queue_chest(3.0)));
    pipeline
        .run(host_graph(), &mut scene, &mut MemoryMaterials::new())
        .expect("build");
    assert_eq!(
        scene.property("Hips/Chest", &ComponentType::Transform, "localScale.z"),
        Some(&PropertyValue::Float(3.0))
    );
}

type Log = Rc<RefCell<Vec<&'static str>>>;

fn recorder(
    log: &Log,
    name: &'static str,
    order: FeatureOrder,
) -> FnPass<impl FnMut(&mut BuildContext<'_>) -> anyhow::Result<()>> {
    let log = Rc::clone(log);
    FnPass::new(name, order, move |cx: &mut BuildContext<'_>| {
        assert_eq!(cx.feature(), name);
        log.borrow_mut().push(name);
        Ok(())
    })
}

#[test]
fn passes_run_by_slot_then_registration() {
    let log: Log = Rc::default();
    let mut pipeline = Pipeline::new(BuildConfig::default())
        .with_pass(recorder(&log, "last", FeatureOrder::LayerControlFix))
        .with_pass(recorder(&log, "b", FeatureOrder::Default))
        .with_pass(recorder(&log, "c", FeatureOrder::Default))
        .with_pass(recorder(&log, "a", FeatureOrder::ForceObjectState));
    assert_eq!(pipeline.len(), 4);
    pipeline
        .run(ControllerGraph::new(), &mut MemoryScene::new(), &mut MemoryMaterials::new())
        .expect("build");

    assert_eq!(*log.borrow(), vec!["a", "b", "c", "last"]);
}

#[test]
fn fixture_avatar_builds_end_to_end() {
    let json = vizij_test_fixtures::graphs::json("avatar-build").expect("graph fixture");
    let mut ids = IdAllocator::new();
    let graph = ControllerGraph::parse_json(&json, &mut ids).expect("parse");
    let scene_json = vizij_test_fixtures::scenes::scene_json("avatar").expect("scene fixture");
    let mut scene = MemoryScene::from_json(&scene_json).expect("scene");
    let mut materials: MemoryMaterials = vizij_test_fixtures::scenes::materials("avatar")
        .expect("materials fixture")
        .expect("avatar has materials");
    let config: BuildConfig =
        vizij_test_fixtures::configs::load("scale-compensation").expect("config fixture");

    let mut pipeline = Pipeline::new(config).with_builtin_passes().with_pass(FnPass::new(
        "Hat Toggle",
        FeatureOrder::ForceObjectState,
        |cx: &mut BuildContext<'_>| {
            let clip = Clip::new("hat on").with_curve(
                CurveBinding::new("Hat", ComponentType::GameObject, "m_IsActive"),
                Curve::constant(1.0),
            );
            cx.queue_resting_clip(&clip);
            Ok(())
        },
    ));
    let out = pipeline.run(graph, &mut scene, &mut materials).expect("build");

    assert_eq!(
        scene.property("Hat", &ComponentType::GameObject, "m_IsActive"),
        Some(&PropertyValue::Bool(true))
    );
    assert!(out.report.timings_ms.is_empty());

    let scale = out.report.scale.as_ref().expect("scale compensation ran");
    assert_eq!(scale.parameters, vec!["tpsScale_1_1".to_string()]);
    assert_eq!(scale.mirrored_curves, 1);
    let body = &scene.objects["Body"].components[0].materials;
    assert_eq!(body[0].0, "Skin");
    assert_ne!(body[1].0, "Tps");

    // "Grow" animates a transform, so its copy lands on Gesture; the FX original
    // stays too because it now drives the compensation parameter.
    let fx = out.graph.controller(ControllerKind::Fx).unwrap();
    let gesture = out.graph.controller(ControllerKind::Gesture).unwrap();
    assert_eq!(names(fx), vec![BASE_PLACEHOLDER_NAME, "Hat", "Grow", SCALE_LAYER_NAME]);
    assert_eq!(names(gesture), vec![BASE_PLACEHOLDER_NAME, "Fist", "Grow"]);
    assert_eq!(gesture.layers()[0].mask, Some(gesture_base_mask()));

    // The hat's control now follows both halves of "Grow".
    assert_eq!(
        layer_controls(&fx.layers()[1]),
        vec![(BlendableLayer::Fx, 2), (BlendableLayer::Gesture, 2)]
    );
    let reindex = out.report.reindex.as_ref().unwrap();
    assert_eq!((reindex.rewritten, reindex.appended), (1, 1));

    let base = out.graph.controller(ControllerKind::Base).unwrap();
    assert_eq!(names(base), vec!["Locomotion"]);

    // What the host writes back reads the same way.
    let written = out.graph.to_json().expect("serialize");
    let reread = ControllerGraph::parse_json(&written, &mut IdAllocator::new()).expect("reparse");
    let fx = reread.controller(ControllerKind::Fx).unwrap();
    assert_eq!(names(fx), vec![BASE_PLACEHOLDER_NAME, "Hat", "Grow", SCALE_LAYER_NAME]);
    assert_eq!(
        layer_controls(&fx.layers()[1]),
        vec![(BlendableLayer::Fx, 2), (BlendableLayer::Gesture, 2)]
    );
}
