// Round lifecycle state owned by the round controller.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    #[default]
    Idle,
    Guessing,
    // Results for the round are on screen.
    Submitted,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    // 1-based; stays at `total_rounds` once the game completes.
    pub round_number: u32,
    pub total_rounds: u32,
    pub total_score: u32,
    pub round_score: u32,
    pub phase: RoundPhase,
}

impl RoundState {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            round_number: 1,
            total_rounds,
            total_score: 0,
            round_score: 0,
            phase: RoundPhase::Idle,
        }
    }

    pub fn is_last_round(&self) -> bool {
        self.round_number >= self.total_rounds
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RoundPhase::Complete
    }
}
