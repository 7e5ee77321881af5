use serde::{Deserialize, Serialize};

/// Which screen of the builder the user is on.
///
/// Both transitions (`Edit -> Review`, `Review -> Edit`) are always allowed;
/// the review screen itself gates submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderStep {
    #[default]
    Edit,
    Review,
}

/// Which canvas renders the fable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderMode {
    #[default]
    Graph,
    Form,
}

/// How edges are drawn on the graph canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeStyle {
    #[default]
    Bezier,
    Straight,
    Step,
    SmoothStep,
}

/// View-only flags. None of them affect the document or its dirty state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: BuilderMode,
    pub layout_direction: crate::graph::LayoutDirection,
    pub auto_layout: bool,
    pub edge_style: EdgeStyle,
    pub nodes_locked: bool,
    pub palette_open: bool,
    pub config_panel_open: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            mode: BuilderMode::Graph,
            layout_direction: crate::graph::LayoutDirection::LeftToRight,
            auto_layout: true,
            edge_style: EdgeStyle::Bezier,
            nodes_locked: false,
            palette_open: true,
            config_panel_open: true,
        }
    }
}
