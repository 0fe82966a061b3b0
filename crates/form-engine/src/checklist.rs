use std::collections::HashSet;

use autofill_core_types::{ControlKind, NodeId};
use serde::{Deserialize, Serialize};

use crate::ports::DocumentSnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingControl {
    pub node: NodeId,
    pub label: String,
}

/// Required, visible controls still waiting for a value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub complete: bool,
    pub missing: Vec<MissingControl>,
    /// Required visible controls; a radio group counts once.
    pub total: usize,
}

pub fn build_checklist(snapshot: &DocumentSnapshot) -> Checklist {
    let mut checklist = Checklist::default();
    let mut radio_groups: HashSet<&str> = HashSet::new();

    for control in snapshot.controls.iter().filter(|c| c.required && c.visible) {
        let answered = match control.kind {
            ControlKind::Radio => {
                let name = control.name.as_deref().unwrap_or_default();
                if !name.is_empty() && !radio_groups.insert(name) {
                    continue;
                }
                control.checked
                    || snapshot
                        .radios
                        .iter()
                        .filter(|radio| !name.is_empty() && radio.name == name)
                        .any(|radio| radio.checked)
            }
            ControlKind::Checkbox => control.checked,
            _ => !control.value.trim().is_empty(),
        };
        checklist.total += 1;
        if !answered {
            checklist.missing.push(MissingControl {
                node: control.node,
                label: control
                    .label
                    .clone()
                    .or_else(|| control.name.clone())
                    .unwrap_or_else(|| control.node.to_string()),
            });
        }
    }
    checklist.complete = checklist.missing.is_empty();
    checklist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ControlSnapshot, RadioSnapshot};

    fn control(node: u64, kind: ControlKind, value: &str) -> ControlSnapshot {
        ControlSnapshot {
            node: NodeId(node),
            kind,
            label: Some(format!("Field {node}")),
            value: value.into(),
            required: true,
            visible: true,
            ..Default::default()
        }
    }

    #[test]
    fn reports_empty_required_controls() {
        let mut hidden = control(3, ControlKind::Text, "");
        hidden.visible = false;
        let mut optional = control(4, ControlKind::Text, "");
        optional.required = false;
        let snapshot = DocumentSnapshot {
            controls: vec![
                control(1, ControlKind::Email, "jane@x.com"),
                control(2, ControlKind::Text, "  "),
                hidden,
                optional,
            ],
            ..Default::default()
        };
        let checklist = build_checklist(&snapshot);
        assert!(!checklist.complete);
        assert_eq!(checklist.total, 2);
        assert_eq!(checklist.missing.len(), 1);
        assert_eq!(checklist.missing[0].label, "Field 2");
    }

    #[test]
    fn radio_group_counts_once_and_is_answered_by_any_member() {
        let mut yes = control(1, ControlKind::Radio, "yes");
        yes.name = Some("relocate".into());
        let mut no = control(2, ControlKind::Radio, "no");
        no.name = Some("relocate".into());
        let snapshot = DocumentSnapshot {
            controls: vec![yes, no],
            radios: vec![
                RadioSnapshot {
                    node: NodeId(1),
                    name: "relocate".into(),
                    value: "yes".into(),
                    ..Default::default()
                },
                RadioSnapshot {
                    node: NodeId(2),
                    name: "relocate".into(),
                    value: "no".into(),
                    checked: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let checklist = build_checklist(&snapshot);
        assert_eq!(checklist.total, 1);
        assert!(checklist.complete);
    }
}
