use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A job definition as it travels over the HTTP API and sits in the
/// persisted jobs document.
///
/// `enable` is an `Option`: a definition without an explicit
/// enable flag is rejected by [`JobDefine::validate`] rather than silently
/// defaulting either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefine {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub schedule: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<String>,
}

impl JobDefine {
    /// Check the fields every job must carry. Schedule grammar is checked
    /// separately by the scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidJob("name is required".into()));
        }
        if self.command.trim().is_empty() {
            return Err(CoreError::InvalidJob(format!(
                "{}: command is required",
                self.name
            )));
        }
        if self.schedule.trim().is_empty() {
            return Err(CoreError::InvalidJob(format!(
                "{}: schedule is required",
                self.name
            )));
        }
        if self.enable.is_none() {
            return Err(CoreError::InvalidJob(format!(
                "{}: enable must be set explicitly",
                self.name
            )));
        }
        Ok(())
    }

    pub fn enabled(&self) -> bool {
        self.enable.unwrap_or(false)
    }

    /// Copy of this definition with a different enable flag.
    pub fn with_enable(&self, enable: bool) -> Self {
        Self {
            enable: Some(enable),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define() -> JobDefine {
        JobDefine {
            name: "backup".into(),
            command: "/bin/true".into(),
            args: vec![],
            schedule: "*/5 * * * * *".into(),
            creator: "dba".into(),
            enable: Some(true),
            work_dir: None,
        }
    }

    #[test]
    fn complete_define_is_valid() {
        assert!(define().validate().is_ok());
    }

    #[test]
    fn missing_enable_is_rejected() {
        let mut d = define();
        d.enable = None;
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("enable"));
    }

    #[test]
    fn blank_command_is_rejected() {
        let mut d = define();
        d.command = "  ".into();
        assert!(d.validate().is_err());
    }

    #[test]
    fn optional_fields_default_on_deserialize() {
        let json = r#"{"name":"a","command":"/bin/true","schedule":"@hourly","enable":false}"#;
        let d: JobDefine = serde_json::from_str(json).unwrap();
        assert!(d.args.is_empty());
        assert_eq!(d.creator, "");
        assert_eq!(d.work_dir, None);
        assert!(!d.enabled());
    }

    #[test]
    fn with_enable_keeps_other_fields() {
        let d = define().with_enable(false);
        assert_eq!(d.enable, Some(false));
        assert_eq!(d.schedule, "*/5 * * * * *");
    }
}
