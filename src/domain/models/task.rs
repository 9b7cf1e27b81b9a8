//! A running instance of an [`super::app::App`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub app_id: String,
    pub host: String,
    #[serde(default)]
    pub ports: Vec<u32>,
}

impl Task {
    /// The synthetic tag used to find every service belonging to this task.
    pub fn marathon_task_tag(&self) -> String {
        marathon_task_tag(&self.id)
    }
}

/// `marathon_task_tag(task_id) = "marathon-task:" + task_id` — the only
/// logic the service model itself carries.
pub fn marathon_task_tag(task_id: &str) -> String {
    format!("marathon-task:{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_prefixed_with_marathon_task() {
        assert_eq!(marathon_task_tag("serviceA.0"), "marathon-task:serviceA.0");
    }

    #[test]
    fn task_method_matches_free_function() {
        let task = Task {
            id: "serviceA.0".to_string(),
            ..Default::default()
        };
        assert_eq!(task.marathon_task_tag(), marathon_task_tag(&task.id));
    }
}
