use serde::{Deserialize, Serialize};

/// Canvas interactions a control can suspend while it runs its own gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Zoom,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    zoom: bool,
    drag: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            zoom: true,
            drag: true,
        }
    }
}

impl Features {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Zoom => self.zoom,
            Feature::Drag => self.drag,
        }
    }

    /// Returns whether the flag actually changed
    pub fn set(&mut self, feature: Feature, enabled: bool) -> bool {
        let flag = match feature {
            Feature::Zoom => &mut self.zoom,
            Feature::Drag => &mut self.drag,
        };
        let changed = *flag != enabled;
        *flag = enabled;
        changed
    }
}
