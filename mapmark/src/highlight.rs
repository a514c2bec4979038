//! Emphasis state machine shared by the rendered map and the input list.
//!
//! At most one region is emphasized at a time and the last interaction wins.
//! Emphasis is sticky: there is no interaction that returns to idle, only a new
//! document does. Rendering is a pure function of the store and the state, and
//! every transition repaints every region.

use crate::config::EmphasisTheme;
use crate::model::PaintStyle;
use crate::store::RegionStore;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum Interaction {
    Hover(usize),
    Focus(usize),
    Click(usize),
}

impl Interaction {
    pub fn index(self) -> usize {
        match self {
            Interaction::Hover(i) | Interaction::Focus(i) | Interaction::Click(i) => i,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmphasisState {
    emphasized: Option<usize>,
}

/// Outcome of one delivered interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub emphasized: Option<usize>,
    /// Input that should take keyboard focus; only set for clicks on the map.
    pub focus_input: Option<usize>,
    pub applied: bool,
}

impl EmphasisState {
    pub fn emphasized(&self) -> Option<usize> { self.emphasized }

    pub fn is_idle(&self) -> bool { self.emphasized.is_none() }

    /// Applies `event` to a document of `region_count` regions. Events naming
    /// a region outside the document are dropped without a state change.
    pub fn apply(&mut self, event: Interaction, region_count: usize) -> Transition {
        let index = event.index();
        if index >= region_count {
            tracing::debug!(?event, region_count, "interaction outside document ignored");
            return Transition { emphasized: self.emphasized, focus_input: None, applied: false };
        }
        self.emphasized = Some(index);
        let focus_input = match event {
            Interaction::Click(i) => Some(i),
            Interaction::Hover(_) | Interaction::Focus(_) => None,
        };
        Transition { emphasized: self.emphasized, focus_input, applied: true }
    }
}

/// Paint one region should show right now. `None` fields mean "remove the
/// inline property".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegionPaint {
    pub index: usize,
    pub emphasized: bool,
    #[serde(flatten)]
    pub style: PaintStyle,
}

pub fn paint_plan(store: &RegionStore, state: &EmphasisState, theme: &EmphasisTheme) -> Vec<RegionPaint> {
    store
        .iter()
        .map(|r| {
            let emphasized = state.emphasized == Some(r.index);
            let style = if emphasized {
                PaintStyle {
                    fill: Some(theme.fill.clone()),
                    stroke: theme.stroke.clone().or_else(|| r.original_style.stroke.clone()),
                    stroke_width: theme
                        .stroke_width
                        .clone()
                        .or_else(|| r.original_style.stroke_width.clone()),
                }
            } else {
                r.original_style.clone()
            };
            RegionPaint { index: r.index, emphasized, style }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Region;

    fn store() -> RegionStore {
        let styled = |i: usize, fill: &str| {
            Region::new(i, format!("r{i}"), PaintStyle { fill: Some(fill.into()), ..PaintStyle::default() })
        };
        RegionStore::new(vec![styled(0, "#010101"), Region::new(1, "r1".into(), PaintStyle::default()), styled(2, "#030303")])
    }

    #[test]
    fn starts_idle_and_ignores_unknown_regions() {
        let mut s = EmphasisState::default();
        assert!(s.is_idle());
        let t = s.apply(Interaction::Hover(9), 3);
        assert!(!t.applied);
        assert!(s.is_idle());
    }

    #[test]
    fn click_requests_input_focus_but_hover_does_not() {
        let mut s = EmphasisState::default();
        assert_eq!(s.apply(Interaction::Hover(0), 3).focus_input, None);
        assert_eq!(s.apply(Interaction::Focus(1), 3).focus_input, None);
        let t = s.apply(Interaction::Click(2), 3);
        assert_eq!((t.emphasized, t.focus_input), (Some(2), Some(2)));
    }

    #[test]
    fn plan_restores_everything_but_the_emphasized_region() {
        let st = store();
        let theme = EmphasisTheme { stroke_width: Some("2".into()), ..EmphasisTheme::default() };
        let mut s = EmphasisState::default();
        s.apply(Interaction::Hover(0), st.len());
        s.apply(Interaction::Hover(1), st.len());
        let plan = paint_plan(&st, &s, &theme);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].style.fill.as_deref(), Some("#010101"));
        assert!(!plan[0].emphasized);
        assert!(plan[1].emphasized);
        assert_eq!(plan[1].style.fill.as_deref(), Some(theme.fill.as_str()));
        assert_eq!(plan[1].style.stroke_width.as_deref(), Some("2"));
        assert_eq!(plan[2].style, st.get(2).unwrap().original_style);
    }

    #[test]
    fn idle_plan_is_the_original_styles() {
        let st = store();
        let plan = paint_plan(&st, &EmphasisState::default(), &EmphasisTheme::default());
        assert!(plan.iter().zip(st.iter()).all(|(p, r)| !p.emphasized && p.style == r.original_style));
    }
}
