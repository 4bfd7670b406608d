use comms::{
    Command, MapFrame, Reply,
    specs::{ActivationSpec, DataPoint, ModelState, OptimizerSpec, StepMetrics},
};
use serde_json::{Value, json};

#[test]
fn legacy_train_step_request() {
    let text = json!({
        "type": "train_step",
        "config": { "architecture": [10], "learningRate": 0.1, "activation": "ReLU" },
        "model": { "weights": [], "biases": [] },
        "data": [{ "x": 0.5, "y": 0.5, "label": 1 }]
    })
    .to_string();

    let Some(Command::TrainStep {
        config: Some(config),
        model: Some(model),
        data: Some(data),
    }) = Command::parse(&text).unwrap()
    else {
        panic!("expected a complete train step");
    };

    assert_eq!(config.architecture.as_deref(), Some(&[10][..]));
    assert_eq!(config.activation, Some(ActivationSpec::Relu));
    assert_eq!(config.dropout, None);
    assert_eq!(config.learning_rate, Some(0.1));
    assert_eq!(config.optimizer, None);
    assert_eq!(model, ModelState::default());
    assert_eq!(data, [DataPoint::new(0.5, 0.5, 1)]);
}

#[test]
fn unknown_optimizer_falls_back_to_adam() {
    let text = r#"{"type": "update_config", "payload": {"optimizer": "lbfgs", "batchSize": 8}}"#;
    let Some(Command::UpdateConfig { payload }) = Command::parse(text).unwrap() else {
        panic!("expected a config update");
    };

    assert_eq!(payload.optimizer, Some(OptimizerSpec::Adam));
    assert_eq!(payload.batch_size, Some(8));
    assert_eq!(payload.learning_rate, None);
}

#[test]
fn generate_data_request() {
    let text = r#"{"type": "generate_data", "distribution": "moons", "num_classes": 3}"#;
    let cmd = Command::parse(text).unwrap().unwrap();

    assert_eq!(
        cmd,
        Command::GenerateData {
            distribution: "moons".into(),
            num_classes: 3
        }
    );
}

#[test]
fn replies_are_type_tagged() {
    let synced = Reply::ArchitectureSynced {
        payload: comms::msg::ArchitectureSynced {
            hidden_layers: vec![4, 3],
        },
    };
    let json: Value = serde_json::from_str(&synced.to_json().unwrap()).unwrap();
    assert_eq!(json, json!({"type": "architecture_synced", "payload": {"hidden_layers": [4, 3]}}));

    let result = Reply::StepResult {
        model: Some(ModelState::default()),
        metrics: StepMetrics { loss: 1., step: 1 },
    };
    let back: Reply = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(back, result);
}

#[test]
fn map_frame_wire_form() {
    let frame = MapFrame::new(4, 2, vec![128; 4 * 2 * 3]).unwrap();
    let buf = frame.encode();

    assert_eq!(buf.len(), comms::FRAME_HEADER_SIZE + 24);
    assert_eq!(buf[0], comms::MAP_FRAME_KIND);
    assert_eq!(MapFrame::decode(&buf).unwrap().pixel(3, 1), Some([128; 3]));
}
