use crate::types::{AnswerId, QuestionId};

/// Acceptance dimension of a question.
///
/// Valid transitions are `NoneAccepted -> Accepted(x)`, `Accepted(x) ->
/// Accepted(y)` (which implicitly unaccepts `x`) and `Accepted(x) ->
/// NoneAccepted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptanceState {
    NoneAccepted,
    Accepted(AnswerId),
}

impl From<Option<AnswerId>> for AcceptanceState {
    fn from(pointer: Option<AnswerId>) -> Self {
        match pointer {
            Some(answer_id) => AcceptanceState::Accepted(answer_id),
            None => AcceptanceState::NoneAccepted,
        }
    }
}

impl AcceptanceState {
    pub fn accepted_answer(self) -> Option<AnswerId> {
        match self {
            AcceptanceState::Accepted(answer_id) => Some(answer_id),
            AcceptanceState::NoneAccepted => None,
        }
    }

    /// Plans the transition that makes `target` the accepted answer.
    ///
    /// Returns `None` when `target` is already accepted.
    pub fn accept(self, question_id: QuestionId, target: AnswerId) -> Option<AcceptanceChangeset> {
        match self {
            AcceptanceState::Accepted(current) if current == target => None,
            _ => Some(AcceptanceChangeset {
                question_id,
                previous: self.accepted_answer(),
                next: Some(target),
            }),
        }
    }

    /// Plans the transition that clears `target`.
    ///
    /// Returns `None` when `target` is not the accepted answer.
    pub fn unaccept(self, question_id: QuestionId, target: AnswerId) -> Option<AcceptanceChangeset> {
        match self {
            AcceptanceState::Accepted(current) if current == target => Some(AcceptanceChangeset {
                question_id,
                previous: Some(current),
                next: None,
            }),
            _ => None,
        }
    }
}

/// A single acceptance transition, persisted as one unit.
///
/// Storage applies it in a fixed order: clear the previous answer's flag, set
/// the next answer's flag, then move the question pointer from `previous` to
/// `next`. The pointer move is conditional on the stored pointer still being
/// `previous`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcceptanceChangeset {
    pub question_id: QuestionId,
    pub previous: Option<AnswerId>,
    pub next: Option<AnswerId>,
}

impl AcceptanceChangeset {
    /// The answer whose flag must be cleared, if any.
    pub fn clears(&self) -> Option<AnswerId> {
        self.previous.filter(|previous| Some(*previous) != self.next)
    }

    /// The answer whose flag must be set, if any.
    pub fn sets(&self) -> Option<AnswerId> {
        self.next.filter(|next| Some(*next) != self.previous)
    }
}
