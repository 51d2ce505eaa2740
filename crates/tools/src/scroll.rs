//! Infinite-scroll handling: repeated scroll-and-measure until the page
//! stops growing.
//!
//! The convergence decision is pure state ([`Convergence`]); the operation
//! wires it to the live tab. Measurements are either the match count of a
//! caller-supplied selector or the page scroll height.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use browser::{locator, BrowserError, Selector, SessionManager, Tab};

use crate::args;
use crate::error::{OpError, OpResult};

/// What one scroll iteration decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Scrolling,
    Converged,
    Exhausted,
}

/// Convergence tracker. Feed it one measurement per iteration; it reports
/// whether to keep scrolling.
///
/// The initial measure is seeded at 0, which stands for "no content seen
/// yet" - it does not count as a real observation, so convergence needs two
/// equal observed measurements. A page that truly measures 0 twice in a row
/// still converges.
#[derive(Debug)]
pub struct Convergence {
    last_measure: u64,
    iterations: u32,
    max_iterations: u32,
}

impl Convergence {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            last_measure: 0,
            iterations: 0,
            max_iterations,
        }
    }

    /// Record one post-scroll measurement.
    pub fn observe(&mut self, measure: u64) -> ScrollState {
        self.iterations += 1;
        if self.iterations > 1 && measure == self.last_measure {
            return ScrollState::Converged;
        }
        self.last_measure = measure;
        if self.iterations >= self.max_iterations {
            ScrollState::Exhausted
        } else {
            ScrollState::Scrolling
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn last_measure(&self) -> u64 {
        self.last_measure
    }
}

pub async fn handle_infinite_scroll(manager: &Arc<SessionManager>, args: &Value) -> OpResult {
    let max_scrolls = args::opt_u64(args, "max_scrolls", 10) as u32;
    let pause = args::opt_f64(args, "scroll_pause", 2.0).max(0.0);
    let check_selector = args::opt_str(args, "check_selector")
        .map(|s| Selector::Css(s.to_string()));

    manager.ensure().await?;
    let tab = manager.current_tab().await?;

    let mut convergence = Convergence::new(max_scrolls);
    let mut state = ScrollState::Scrolling;

    while convergence.iterations() < max_scrolls {
        tab.scroll_to_bottom().await.map_err(BrowserError::from)?;
        tokio::time::sleep(Duration::from_secs_f64(pause)).await;

        let measure = match &check_selector {
            Some(selector) => count_matches(&tab, selector).await?,
            None => tab.scroll_height().await.map_err(BrowserError::from)?,
        };

        state = convergence.observe(measure);
        if state != ScrollState::Scrolling {
            break;
        }
    }

    let mut result = json!({
        "success": true,
        "scroll_count": convergence.iterations(),
        "converged": state == ScrollState::Converged,
    });
    if check_selector.is_some() {
        result["final_count"] = json!(convergence.last_measure());
    } else {
        result["final_height"] = json!(convergence.last_measure());
    }
    Ok(result)
}

async fn count_matches(tab: &Tab, selector: &Selector) -> Result<u64, OpError> {
    let value = tab
        .evaluate(&locator::count_expr(selector))
        .await
        .map_err(BrowserError::from)?;
    Ok(value.as_u64().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(measures: &[u64], max: u32) -> (ScrollState, u32, u64) {
        let mut convergence = Convergence::new(max);
        let mut state = ScrollState::Scrolling;
        for &m in measures {
            if convergence.iterations() >= max {
                break;
            }
            state = convergence.observe(m);
            if state != ScrollState::Scrolling {
                break;
            }
        }
        (state, convergence.iterations(), convergence.last_measure())
    }

    #[test]
    fn stops_when_two_measurements_repeat() {
        let (state, iterations, measure) = run(&[10, 20, 20, 30], 10);
        assert_eq!(state, ScrollState::Converged);
        assert_eq!(iterations, 3);
        assert_eq!(measure, 20);
    }

    #[test]
    fn exhausts_at_max_scrolls() {
        let (state, iterations, _) = run(&[1, 2, 3, 4, 5, 6], 3);
        assert_eq!(state, ScrollState::Exhausted);
        assert_eq!(iterations, 3);
    }

    #[test]
    fn never_exceeds_max_scrolls() {
        for max in 1..5 {
            let (_, iterations, _) = run(&[1, 2, 3, 4, 5, 6, 7, 8], max);
            assert!(iterations <= max);
        }
    }

    #[test]
    fn first_zero_measurement_is_no_content_not_convergence() {
        // The 0 seed is not a real observation: one zero reading keeps
        // scrolling, two in a row converge.
        let (state, iterations, _) = run(&[0, 0], 10);
        assert_eq!(state, ScrollState::Converged);
        assert_eq!(iterations, 2);

        let (state, iterations, measure) = run(&[0, 5, 5], 10);
        assert_eq!(state, ScrollState::Converged);
        assert_eq!(iterations, 3);
        assert_eq!(measure, 5);
    }

    #[test]
    fn growing_page_keeps_scrolling() {
        let (state, iterations, measure) = run(&[100, 200], 2);
        assert_eq!(state, ScrollState::Exhausted);
        assert_eq!(iterations, 2);
        assert_eq!(measure, 200);
    }

    #[test]
    fn zero_max_scrolls_never_iterates() {
        let (_, iterations, _) = run(&[1, 2, 3], 0);
        assert_eq!(iterations, 0);
    }
}
