use std::fmt;

use crate::effects::Stage;

/// One ffmpeg filter with its ordered `key=value` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    /// Which effect this filter implements
    pub stage: Stage,
    /// ffmpeg filter name, e.g. `gblur`
    pub filter: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl FilterStage {
    pub fn new(stage: Stage, filter: &'static str) -> Self {
        Self {
            stage,
            filter,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.filter)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '=' } else { ':' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Ordered filter chain for one whole clip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// ffmpeg filter names in chain order
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.filter).collect()
    }

    pub fn find(&self, filter: &str) -> Option<&FilterStage> {
        self.stages.iter().find(|s| s.filter == filter)
    }

    /// The `-vf` argument. An empty chain becomes the pass-through `null` filter.
    pub fn to_filter_string(&self) -> String {
        if self.stages.is_empty() {
            return "null".to_string();
        }
        self.stages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}
