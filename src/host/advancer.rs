use std::time::Duration;

use crate::config;
use crate::errors::AdvanceError;
use crate::notify::Notifier;
use crate::page::HostPage;

// --- Retrying Episode Advancer ---
//
// Host-page dropdown menus render asynchronously, so a first attempt failing
// says nothing about the page's structure. This is the one place a DOM
// timing race is treated as retryable rather than fatal.

pub struct RetryingEpisodeAdvancer {
    max_attempts: u32,
    settle: Duration,
    season_settle: Duration,
    backoff: Duration,
}

impl RetryingEpisodeAdvancer {
    pub fn new() -> Self {
        RetryingEpisodeAdvancer {
            max_attempts: config::MAX_ADVANCE_ATTEMPTS,
            settle: Duration::from_millis(config::MENU_SETTLE_MS),
            season_settle: Duration::from_millis(config::SEASON_SETTLE_MS),
            backoff: Duration::from_millis(config::ADVANCE_RETRY_BACKOFF_MS),
        }
    }

    #[cfg(test)]
    pub fn with_timing(max_attempts: u32, settle: Duration, backoff: Duration) -> Self {
        RetryingEpisodeAdvancer {
            max_attempts,
            settle,
            season_settle: settle,
            backoff,
        }
    }

    /// Switch to the next episode. Resolves true when a switch happened,
    /// false both for the terminal case (nothing after the active item) and
    /// for exhausted retries; the caller only ever degrades gracefully.
    pub async fn advance(
        &self,
        page: &dyn HostPage,
        season_rollover: bool,
        notifier: &dyn Notifier,
    ) -> bool {
        match self.advance_with_retry(page, season_rollover, notifier).await {
            Ok(advanced) => advanced,
            Err(e) => {
                log::error!("{}", e);
                notifier.error("Could not switch to the next episode");
                false
            }
        }
    }

    async fn advance_with_retry(
        &self,
        page: &dyn HostPage,
        season_rollover: bool,
        notifier: &dyn Notifier,
    ) -> Result<bool, AdvanceError> {
        let mut last = None;
        for attempt in 1..=self.max_attempts {
            match self.try_advance(page, season_rollover, notifier).await {
                Ok(advanced) => return Ok(advanced),
                Err(e) => {
                    log::warn!(
                        "Advance attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        e
                    );
                    last = Some(e);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
        Err(AdvanceError::AttemptsExhausted {
            attempts: self.max_attempts,
            last: Box::new(last.unwrap_or(AdvanceError::NoEpisodeList)),
        })
    }

    async fn try_advance(
        &self,
        page: &dyn HostPage,
        season_rollover: bool,
        notifier: &dyn Notifier,
    ) -> Result<bool, AdvanceError> {
        let menu = page.episode_menu().ok_or(AdvanceError::NoEpisodeList)?;
        let active = menu.active.ok_or(AdvanceError::NoActiveEpisode)?;

        if menu.active_is_last() {
            log::info!(
                "Last episode of the season ({}/{})",
                active + 1,
                menu.len()
            );
            if season_rollover {
                return self.roll_to_next_season(page, notifier).await;
            }
            notifier.success("Season finished");
            return Ok(false);
        }

        let next = menu
            .next_index()
            .ok_or(AdvanceError::NoActiveEpisode)?;
        let next_label = menu.labels[next].clone();

        if !page.open_episode_menu() {
            return Err(AdvanceError::MenuDidNotOpen);
        }
        tokio::time::sleep(self.settle).await;
        if !page.activate_episode(next) {
            return Err(AdvanceError::ActivationFailed { index: next });
        }

        log::info!(
            "Switched to episode '{}' ({}/{})",
            next_label,
            next + 1,
            menu.len()
        );
        notifier.success(&format!("Next episode: {}", next_label));
        Ok(true)
    }

    /// Same algorithm one level up, then land on the first episode of the
    /// new season.
    async fn roll_to_next_season(
        &self,
        page: &dyn HostPage,
        notifier: &dyn Notifier,
    ) -> Result<bool, AdvanceError> {
        let menu = page.season_menu().ok_or(AdvanceError::NoSeasonList)?;
        let Some(next) = menu.next_index() else {
            log::info!("Last season; series finished");
            notifier.success("Series finished!");
            return Ok(false);
        };
        let next_label = menu.labels[next].clone();

        if !page.open_season_menu() {
            return Err(AdvanceError::MenuDidNotOpen);
        }
        tokio::time::sleep(self.settle).await;
        if !page.activate_season(next) {
            return Err(AdvanceError::ActivationFailed { index: next });
        }
        log::info!("Switched to season '{}'", next_label);

        // The episode list repopulates for the new season before it can be
        // opened again.
        tokio::time::sleep(self.season_settle).await;
        if !page.open_episode_menu() {
            return Err(AdvanceError::MenuDidNotOpen);
        }
        tokio::time::sleep(self.settle).await;
        if !page.activate_episode(0) {
            return Err(AdvanceError::ActivationFailed { index: 0 });
        }

        notifier.success(&format!("Moved to season: {}", next_label));
        Ok(true)
    }
}

impl Default for RetryingEpisodeAdvancer {
    fn default() -> Self {
        Self::new()
    }
}
