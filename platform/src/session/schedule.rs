use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::login::PollTicket;

/// Interval between two QR status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Recurring login poll bound to a [PollTicket].
///
/// Dropping the schedule cancels it: no further ticks are produced. A tick
/// never fires before the previous poll has been handled because the owner
/// awaits [PollSchedule::tick] again only after finishing the round trip.
///
/// # Cancel Safety
///
/// [PollSchedule::tick] is cancel-safe and can be used in [tokio::select!].
#[derive(Debug)]
pub struct PollSchedule {
    ticket: PollTicket,
    interval: Interval,
}

impl PollSchedule {
    /// Creates a schedule whose first tick fires one `period` from now.
    pub fn new(ticket: PollTicket, period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        // a slow poll must not cause a burst of catch-up polls
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        PollSchedule { ticket, interval }
    }

    pub fn ticket(&self) -> PollTicket {
        self.ticket
    }

    /// Waits for the next tick and yields the ticket to poll with.
    pub async fn tick(&mut self) -> PollTicket {
        self.interval.tick().await;

        self.ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_spaced_by_the_period() {
        let started = Instant::now();
        let mut schedule = PollSchedule::new(PollTicket(7), Duration::from_secs(2));

        assert_eq!(schedule.tick().await, PollTicket(7));
        assert_eq!(started.elapsed(), Duration::from_secs(2));

        schedule.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }
}
