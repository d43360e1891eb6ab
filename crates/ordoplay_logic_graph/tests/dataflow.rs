// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end behavior of animations, bindings, anchors and structured links.

use ordoplay_logic_graph::animation::{AnimationChannel, ChannelData, InterpolationType};
use ordoplay_logic_graph::{
    logic_fn, AnchorProjector, AnimationNodeConfig, BindingTarget, BindingUpdate, BindingValue, EngineConfig,
    EngineError, LinkError, LogicEngine, NodeError, NodeId, NodeKindTag, Projection, PropertyError,
    PropertySpec, PropertyType, PropertyValue, ScriptInterface,
};
use std::cell::RefCell;
use std::rc::Rc;

fn channel(data: ChannelData) -> AnimationChannel {
    AnimationChannel::new(data).unwrap()
}

fn float(engine: &LogicEngine, node: NodeId, path: &str) -> f32 {
    let output = engine.output(node, path).unwrap();
    engine.get(output).and_then(PropertyValue::as_float).unwrap()
}

fn play(engine: &mut LogicEngine, node: NodeId, time_delta: f32, looping: bool) {
    let inputs = [
        ("play", PropertyValue::Bool(true)),
        ("loop", PropertyValue::Bool(looping)),
        ("timeDelta", PropertyValue::Float(time_delta)),
    ];
    for (name, value) in inputs {
        let input = engine.input(node, name).unwrap();
        engine.set(input, value).unwrap();
    }
}

#[derive(Default, Clone)]
struct Recorder(Rc<RefCell<Vec<BindingUpdate>>>);

impl BindingTarget for Recorder {
    fn apply(&mut self, update: BindingUpdate) -> Result<(), NodeError> {
        self.0.borrow_mut().push(update);
        Ok(())
    }
}

#[test]
fn test_linear_animation_samples() {
    let mut engine = LogicEngine::default();
    let anim = engine
        .create_animation(
            "fade",
            AnimationNodeConfig::new([channel(ChannelData::new(
                "alpha",
                vec![0.0, 2.0],
                vec![0.0_f32, 10.0],
                InterpolationType::Linear,
            ))]),
        )
        .unwrap();

    play(&mut engine, anim, 0.0, false);
    engine.update().unwrap();
    assert_eq!(float(&engine, anim, "alpha"), 0.0);

    play(&mut engine, anim, 1.0, false);
    engine.update().unwrap();
    assert_eq!(float(&engine, anim, "alpha"), 5.0);
    assert_eq!(float(&engine, anim, "progress"), 0.5);

    engine.update().unwrap();
    assert_eq!(float(&engine, anim, "alpha"), 10.0);
    assert_eq!(float(&engine, anim, "duration"), 2.0);
}

#[test]
fn test_step_switches_at_midpoint() {
    let mut engine = LogicEngine::default();
    let config = AnimationNodeConfig::new([channel(ChannelData::new(
        "state",
        vec![0.0, 1.0],
        vec![[1.0_f32, 0.0], [2.0, 0.0]],
        InterpolationType::Step,
    ))])
    .progress_driven();
    let anim = engine.create_animation("toggle", config).unwrap();
    let progress = engine.input(anim, "progress").unwrap();
    let state = engine.output(anim, "state").unwrap();

    engine.set(progress, 0.49_f32).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.get(state), Some(&PropertyValue::Vec2f([1.0, 0.0])));

    engine.set(progress, 0.5_f32).unwrap();
    engine.update().unwrap();
    assert_eq!(engine.get(state), Some(&PropertyValue::Vec2f([2.0, 0.0])));
}

#[test]
fn test_loop_wraps_elapsed_time() {
    let mut engine = LogicEngine::default();
    let anim = engine
        .create_animation(
            "spin",
            AnimationNodeConfig::new([channel(ChannelData::new(
                "angle",
                vec![0.0, 2.0],
                vec![0.0_f32, 360.0],
                InterpolationType::Linear,
            ))]),
        )
        .unwrap();

    play(&mut engine, anim, 1.0, true);
    for _ in 0..5 {
        engine.update().unwrap();
    }
    assert_eq!(engine.animation(anim).map(|a| a.elapsed()), Some(1.0));
    assert_eq!(float(&engine, anim, "angle"), 180.0);
}

#[test]
fn test_cubic_quaternion_has_unit_length() {
    let mut engine = LogicEngine::default();
    let data = ChannelData::new(
        "rotation",
        vec![0.0, 1.0],
        vec![[0.0_f32, 0.0, 0.0, 1.0], [0.0, 0.7071, 0.0, 0.7071]],
        InterpolationType::CubicQuaternion,
    )
    .with_tangents(vec![[0.3_f32, 0.1, 0.0, 0.0]; 2], vec![[0.0_f32, 0.4, 0.2, 0.0]; 2]);
    let anim = engine
        .create_animation("turn", AnimationNodeConfig::new([channel(data)]).progress_driven())
        .unwrap();
    let progress = engine.input(anim, "progress").unwrap();
    let rotation = engine.output(anim, "rotation").unwrap();

    for step in 1..10 {
        engine.set(progress, step as f32 / 10.0).unwrap();
        engine.update().unwrap();
        let q = engine.get(rotation).and_then(PropertyValue::as_vec4f).unwrap();
        let length = q.iter().map(|c| c * c).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < 1e-5, "length {length} at step {step}");
    }
}

#[test]
fn test_animation_drives_binding_through_struct_link() {
    let mut engine = LogicEngine::default();
    let anim = engine
        .create_animation(
            "move",
            AnimationNodeConfig::new([channel(ChannelData::new(
                "x",
                vec![0.0, 1.0],
                vec![0.0_f32, 4.0],
                InterpolationType::Linear,
            ))])
            .progress_driven(),
        )
        .unwrap();

    let pose = || {
        PropertySpec::structure(
            "pose",
            [
                PropertySpec::primitive("x", PropertyType::Float),
                PropertySpec::array("weights", 2, PropertySpec::primitive("", PropertyType::Float)),
            ],
        )
    };
    let mapper = engine
        .create_script(
            "mapper",
            ScriptInterface::new([PropertySpec::primitive("x", PropertyType::Float)], [pose()]),
            logic_fn(|io| {
                let x = io.input("x")?.as_float().unwrap_or_default();
                io.set_output("pose.x", x)?;
                io.set_output("pose.weights.1", x / 2.0)?;
                Ok(())
            }),
        )
        .unwrap();

    let recorder = Recorder::default();
    let binding = engine
        .create_binding("node", &[pose()], Box::new(recorder.clone()))
        .unwrap();

    let anim_x = engine.output(anim, "x").unwrap();
    let mapper_x = engine.input(mapper, "x").unwrap();
    engine.link(anim_x, mapper_x).unwrap();
    let pose_out = engine.output(mapper, "pose").unwrap();
    let pose_in = engine.input(binding, "pose").unwrap();
    engine.link(pose_out, pose_in).unwrap();

    let nested = engine.input(binding, "pose.x").unwrap();
    assert!(matches!(engine.set(nested, 1.0_f32), Err(PropertyError::LinkedInput(_))));

    let progress = engine.input(anim, "progress").unwrap();
    engine.set(progress, 0.5_f32).unwrap();
    engine.update().unwrap();

    let updates = recorder.0.borrow();
    assert!(updates.contains(&BindingUpdate {
        path: "pose.x".into(),
        value: BindingValue::Value(PropertyValue::Float(2.0)),
    }));
    assert!(updates.contains(&BindingUpdate {
        path: "pose.weights".into(),
        value: BindingValue::Array(vec![PropertyValue::Float(0.0), PropertyValue::Float(1.0)]),
    }));
}

#[test]
fn test_struct_link_requires_same_shape() {
    let mut engine = LogicEngine::default();
    let producer = engine
        .create_script(
            "producer",
            ScriptInterface::new(
                [],
                [PropertySpec::structure("s", [PropertySpec::primitive("a", PropertyType::Float)])],
            ),
            logic_fn(|_| Ok(())),
        )
        .unwrap();
    let consumer = engine
        .create_script(
            "consumer",
            ScriptInterface::new(
                [PropertySpec::structure("s", [PropertySpec::primitive("b", PropertyType::Float)])],
                [],
            ),
            logic_fn(|_| Ok(())),
        )
        .unwrap();

    let source = engine.output(producer, "s").unwrap();
    let target = engine.input(consumer, "s").unwrap();
    assert!(matches!(engine.link(source, target), Err(LinkError::TypeMismatch { .. })));

    // Linking a child blocks linking its parent and vice versa
    let producer_field = engine.output(producer, "s.a").unwrap();
    let consumer_field = engine.input(consumer, "s.b").unwrap();
    engine.link(producer_field, consumer_field).unwrap();
    let whole = engine.input(consumer, "s").unwrap();
    assert!(matches!(engine.link(source, whole), Err(LinkError::TypeMismatch { .. } | LinkError::AlreadyLinked(_))));
}

#[test]
fn test_anchor_feeds_script_every_update() {
    struct Moving(f32);

    impl AnchorProjector for Moving {
        fn project(&mut self) -> Result<Projection, NodeError> {
            self.0 += 1.0;
            Ok(Projection {
                viewport_coords: [self.0, 2.0 * self.0],
                depth: 0.5,
            })
        }
    }

    let mut engine = LogicEngine::new(EngineConfig {
        update_report: true,
        ..Default::default()
    });
    let anchor = engine.create_anchor("label", Box::new(Moving(0.0)));
    let follower = engine
        .create_script(
            "follower",
            ScriptInterface::new(
                [PropertySpec::primitive("coords", PropertyType::Vec2f)],
                [PropertySpec::primitive("x", PropertyType::Float)],
            ),
            logic_fn(|io| {
                let coords = io.input("coords")?.as_vec2f().unwrap_or_default();
                io.set_output("x", coords[0])?;
                Ok(())
            }),
        )
        .unwrap();
    let source = engine.output(anchor, "viewportCoords").unwrap();
    let target = engine.input(follower, "coords").unwrap();
    engine.link(source, target).unwrap();

    engine.update().unwrap();
    engine.update().unwrap();
    assert_eq!(float(&engine, follower, "x"), 2.0);
    assert_eq!(engine.last_update_report().unwrap().executed.len(), 2);
    assert_eq!(engine.nodes_of_kind(NodeKindTag::Anchor).count(), 1);
}

#[test]
fn test_destroy_after_unlink() {
    let mut engine = LogicEngine::default();
    let timer = engine.create_timer("clock");
    let consumer = engine
        .create_script(
            "consumer",
            ScriptInterface::new([PropertySpec::primitive("t", PropertyType::Int64)], []),
            logic_fn(|_| Ok(())),
        )
        .unwrap();
    let source = engine.output(timer, "ticker_us").unwrap();
    let target = engine.input(consumer, "t").unwrap();
    engine.link(source, target).unwrap();

    assert!(matches!(engine.destroy(timer), Err(EngineError::NodeStillLinked { .. })));
    assert!(matches!(engine.destroy(consumer), Err(EngineError::NodeStillLinked { .. })));
    engine.unlink(source, target).unwrap();
    engine.destroy(timer).unwrap();
    engine.destroy(consumer).unwrap();
    assert_eq!(engine.node_count(), 0);
    engine.update().unwrap();
}
