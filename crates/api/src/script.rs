//! Scripts: a window configuration plus a list of commands and queries.

use crate::{Command, CommandResult, Query, QueryResult, Session, SessionConfig};
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: SessionConfig,
    pub steps: Vec<Step>,
}

/// One script step. Steps whose `type` starts with `get_` are queries.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Step {
    Command(Command),
    Query(Query),
}

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let is_query = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|tag| tag.starts_with("get_"));
        if is_query {
            serde_json::from_value(value)
                .map(Step::Query)
                .map_err(serde::de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Step::Command)
                .map_err(serde::de::Error::custom)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepResult {
    Command(CommandResult),
    Query(QueryResult),
}

impl StepResult {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StepResult::Command(CommandResult::Error { .. })
                | StepResult::Query(QueryResult::Error { .. })
        )
    }
}

impl Session {
    /// Runs every step in order. A failing step does not stop the script.
    pub fn run_steps(&mut self, steps: Vec<Step>) -> Vec<StepResult> {
        steps
            .into_iter()
            .map(|step| match step {
                Step::Command(command) => StepResult::Command(self.execute(command)),
                Step::Query(query) => StepResult::Query(self.query(query)),
            })
            .collect()
    }
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Runs the script in a fresh session, which is returned for further
    /// inspection.
    pub fn run(self) -> Result<(Session, Vec<StepResult>)> {
        let mut session = Session::new(self.config)?;
        let results = session.run_steps(self.steps);
        Ok((session, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Target;

    const SCRIPT: &str = r##"{
        "config": {"width": 200, "height": 150, "close_enough": 2},
        "steps": [
            {"type": "create_rect", "name": "a", "position": [10, 10], "size": [20, 20],
             "fill": "#FF0000"},
            {"type": "run_idle"},
            {"type": "get_item_at", "x": 31, "y": 15},
            {"type": "hide", "target": {"item": "missing"}},
            {"type": "get_viewport"}
        ]
    }"##;

    #[test]
    fn steps_split_into_commands_and_queries() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.config.width, 200);
        assert_eq!(script.config.canvas.close_enough, 2);
        assert_eq!(script.config.canvas.pixels_per_unit, 1.0);
        assert!(matches!(script.steps[0], Step::Command(Command::CreateRect { .. })));
        assert_eq!(script.steps[2], Step::Query(Query::GetItemAt { x: 31.0, y: 15.0 }));
        assert_eq!(
            script.steps[3],
            Step::Command(Command::Hide {
                target: Target::from("missing")
            })
        );
    }

    #[test]
    fn run_reports_each_step() {
        let (_session, results) = Script::from_json(SCRIPT).unwrap().run().unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(
            results[2],
            StepResult::Query(QueryResult::Item {
                name: Some("a".into())
            })
        );
        assert!(results[3].is_error());
        let StepResult::Query(QueryResult::Viewport(viewport)) = &results[4] else {
            panic!("expected viewport info");
        };
        assert_eq!(viewport.allocation, glam::IVec2::new(200, 150));
    }

    #[test]
    fn unknown_step_type_is_rejected() {
        let err = Script::from_json(r#"{"steps": [{"type": "get_nothing"}]}"#).unwrap_err();
        assert!(err.to_string().contains("get_nothing"));
    }
}
