//! Actions: the audit trail / execution plan a strategy produces

use serde::{Deserialize, Serialize};

/// Kind of transformation applied to a holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ImportPortfolio,
    PensionToPension,
    CapitalToPension,
    EducationToPension,
    EducationToCapital,
    Capitalize,
    TerminationToPension,
    TerminationToCapital,
    Note,
}

/// One transformation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub detail: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl Action {
    pub fn new(
        action_type: ActionType,
        detail: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            action_type,
            detail: detail.into(),
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

/// Ordered action log owned by one scenario build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn record(
        &mut self,
        action_type: ActionType,
        detail: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
    ) {
        self.push(Action::new(action_type, detail, from, to, amount));
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions of one type, in order
    pub fn of_type(&self, action_type: ActionType) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.action_type == action_type)
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }
}
