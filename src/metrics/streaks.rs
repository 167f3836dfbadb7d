use crate::trade::TradeResult;

/// Running win/loss streak counter over closed legs.
/// Order-sensitive: the caller decides what "consecutive" means by the order
/// it feeds legs in. Nothing is re-sorted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakTracker {
    current_wins: u32,
    current_losses: u32,
    pub max_wins: u32,
    pub max_losses: u32,
}

impl StreakTracker {
    #[inline]
    pub fn record(&mut self, result: TradeResult) {
        match result {
            TradeResult::Win => {
                self.current_wins += 1;
                self.current_losses = 0;
                self.max_wins = self.max_wins.max(self.current_wins);
            }
            TradeResult::Loss => {
                self.current_losses += 1;
                self.current_wins = 0;
                self.max_losses = self.max_losses.max(self.current_losses);
            }
            // A closed leg without an outcome neither extends nor breaks a run
            TradeResult::Open => {}
        }
    }
}
