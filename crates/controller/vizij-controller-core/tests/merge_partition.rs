use hashbrown::HashSet;

use vizij_controller_core::params::retain_parameter_drivers;
use vizij_controller_core::{
    BindingDomain, BuildError, Clip, ComponentType, Condition, ConditionMode, Controller,
    ControllerGraph, ControllerKind, ControllerMerger, Curve, CurveBinding, IdAllocator, Motion,
    OwnershipIndex, ReferenceTracker, Transition,
};

fn clip_layer(c: &mut Controller, ids: &mut IdAllocator, name: &str, clip: Clip) {
    c.new_layer(name, ids)
        .new_state("On")
        .with_motion(Motion::Clip(clip));
}

#[test]
fn length_mismatch_fails_before_partitioning() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    let fx = graph.controller_or_insert(ControllerKind::Fx);
    for i in 0..3 {
        clip_layer(fx, &mut ids, &format!("fx {i}"), Clip::new("c"));
    }
    let gesture = graph.controller_or_insert(ControllerKind::Gesture);
    for i in 0..4 {
        clip_layer(gesture, &mut ids, &format!("gesture {i}"), Clip::new("c"));
    }
    let before = graph.clone();

    let err = ControllerMerger::default()
        .partition(&mut graph)
        .expect_err("3 vs 4 layers");
    assert!(matches!(
        err,
        BuildError::LayerCountMismatch {
            into_len: 3,
            from_len: 4,
            ..
        }
    ));
    assert_eq!(graph, before);
}

#[test]
fn driver_chain_is_retained_transitively() {
    const N: usize = 6;
    let mut ids = IdAllocator::new();
    let mut fx = Controller::new(ControllerKind::Fx);
    for i in 0..N {
        let layer = fx.new_layer(format!("link {i}"), &mut ids);
        let state = layer.new_state("On");
        if i + 1 < N {
            state.with_motion(Motion::Clip(
                Clip::new(format!("drive {i}"))
                    .with_curve(CurveBinding::parameter(format!("p{i}")), Curve::constant(1.0)),
            ));
        }
        if i > 0 {
            state.add_transition(Transition {
                destination: None,
                conditions: vec![Condition {
                    parameter: format!("p{}", i - 1),
                    mode: ConditionMode::Greater,
                    threshold: 0.5,
                }],
            });
        }
    }

    let mut keep: HashSet<_> = [fx.layers()[N - 1].id()].into_iter().collect();
    let iterations = retain_parameter_drivers(&fx, &mut keep);
    assert_eq!(keep.len(), N);
    assert!(iterations <= N, "took {iterations} passes");
}

#[test]
fn expression_and_gesture_layers_land_on_their_own_side() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    let mut owners = OwnershipIndex::new();
    let mut tracker = ReferenceTracker::new();

    let expression = CurveBinding::new("Body", ComponentType::SkinnedMeshRenderer, "blendShape.Smile");
    let finger = CurveBinding::new("Hips/Hand/Index", ComponentType::Transform, "localEulerAngles.z");

    let fx = graph.controller_or_insert(ControllerKind::Fx);
    clip_layer(
        fx,
        &mut ids,
        "Smile",
        Clip::new("smile").with_curve(expression.clone(), Curve::constant(100.0)),
    );
    let gesture = graph.controller_or_insert(ControllerKind::Gesture);
    clip_layer(
        gesture,
        &mut ids,
        "Point",
        Clip::new("point").with_curve(finger.clone(), Curve::constant(30.0)),
    );

    let report = ControllerMerger::default()
        .merge(&mut graph, &mut owners, &mut tracker, &mut ids)
        .expect("merge");
    assert_eq!(report.moved, 1);
    assert_eq!(report.copied, 2);

    let gesture = graph.controller(ControllerKind::Gesture).unwrap();
    assert_eq!(gesture.len(), 1);
    assert_eq!(gesture.layers()[0].name, "Point");
    for clip in gesture.clips() {
        assert!(clip.domains().all(|d| d == BindingDomain::Gesture));
        assert!(clip.curve(&expression).is_none());
    }

    let fx = graph.controller(ControllerKind::Fx).unwrap();
    assert_eq!(fx.len(), 1);
    assert_eq!(fx.layers()[0].name, "Smile");
    assert!(fx.clips().iter().all(|c| c.curve(&finger).is_none()));
}

#[test]
fn moved_layers_go_first_on_both_sides() {
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::new();
    let mut owners = OwnershipIndex::new();
    let mut tracker = ReferenceTracker::new();

    let smile = CurveBinding::new("Body", ComponentType::SkinnedMeshRenderer, "blendShape.Smile");
    let wrist = CurveBinding::new("Hips/Hand", ComponentType::Transform, "localEulerAngles.x");

    let fx = graph.controller_or_insert(ControllerKind::Fx);
    clip_layer(fx, &mut ids, "fx smile", Clip::new("a").with_curve(smile.clone(), Curve::constant(100.0)));
    clip_layer(fx, &mut ids, "fx wrist", Clip::new("b").with_curve(wrist.clone(), Curve::constant(10.0)));
    let gesture = graph.controller_or_insert(ControllerKind::Gesture);
    clip_layer(gesture, &mut ids, "gesture smile", Clip::new("c").with_curve(smile, Curve::constant(50.0)));
    clip_layer(gesture, &mut ids, "gesture wrist", Clip::new("d").with_curve(wrist, Curve::constant(20.0)));

    ControllerMerger::default()
        .merge(&mut graph, &mut owners, &mut tracker, &mut ids)
        .expect("merge");

    // Gesture evaluates before FX, so on either side FX's layers still win.
    let names = |c: &Controller| c.layers().iter().map(|l| l.name.clone()).collect::<Vec<_>>();
    let fx = graph.controller(ControllerKind::Fx).unwrap();
    let gesture = graph.controller(ControllerKind::Gesture).unwrap();
    assert_eq!(names(fx), vec!["gesture smile", "fx smile"]);
    assert_eq!(names(gesture), vec!["gesture wrist", "fx wrist"]);
}

#[test]
fn fixture_graph_splits_by_domain() {
    let json = vizij_test_fixtures::graphs::json("gesture-fx-split").expect("fixture");
    let mut ids = IdAllocator::new();
    let mut graph = ControllerGraph::parse_json(&json, &mut ids).expect("parse");
    let mut owners = OwnershipIndex::new();
    let mut tracker = ReferenceTracker::new();
    tracker.record_controller_set(&graph);

    ControllerMerger::default()
        .merge(&mut graph, &mut owners, &mut tracker, &mut ids)
        .expect("merge");

    let gesture = graph.controller(ControllerKind::Gesture).unwrap();
    let fx = graph.controller(ControllerKind::Fx).unwrap();
    let names = |c: &Controller| c.layers().iter().map(|l| l.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(fx), vec!["Hat", "Mixed", "Fist Driver"]);
    // "Fist Driver" only animates a parameter, which keeps it on the FX side; its
    // Gesture copy survives too because "Fist" reads that parameter.
    assert_eq!(names(gesture), vec!["Fist", "Mixed", "Fist Driver"]);
    let driver_copy = &gesture.layers()[2];
    assert_eq!(driver_copy.behaviours().count(), 0);
}
