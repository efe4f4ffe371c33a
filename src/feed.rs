// Draft event feed: applies externally committed picks to a local copy of
// the log and republishes the recomputed turn state.
//
// Every observer recomputes the same answers from the same log; there is
// no authoritative in-memory draft object to synchronize against. The one
// ordering rule is that picks must be applied in increasing pick-number
// order before the turn is recomputed (the lookup is undefined on a gapped
// log), so out-of-order arrivals are buffered until the gap closes.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::draft::{current_player, DraftEngine, DraftPhase, DraftPick};

/// A change to the shared pick log, as observed by this client.
#[derive(Debug, Clone)]
pub enum DraftEvent {
    PickCommitted(DraftPick),
    PickUndone,
}

/// Recomputed turn state published after each applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftUpdate {
    pub phase: DraftPhase,
    pub picks_made: usize,
    pub total_picks: usize,
    /// 1-based number of the next pick, if the draft is still running.
    pub next_pick_number: Option<u32>,
    /// Id of the player on the clock, if the draft is still running.
    pub on_clock: Option<String>,
    /// Drivers still available.
    pub remaining: usize,
}

/// Consume draft events until the sender side closes, emitting a
/// [`DraftUpdate`] after every event that changes the applied log.
///
/// Returns the final applied log, which callers can use to seed a
/// successor loop or verify convergence.
pub async fn run(
    engine: &DraftEngine,
    mut events: mpsc::Receiver<DraftEvent>,
    updates: mpsc::Sender<DraftUpdate>,
) -> Vec<DraftPick> {
    let mut applied: Vec<DraftPick> = Vec::new();
    let mut buffered: BTreeMap<u32, DraftPick> = BTreeMap::new();

    while let Some(event) = events.recv().await {
        match event {
            DraftEvent::PickCommitted(pick) => {
                let next_needed = applied.len() as u32 + 1;
                if pick.pick_number < next_needed {
                    debug!(pick.pick_number, "duplicate pick event ignored");
                    continue;
                }
                if pick.pick_number > next_needed {
                    debug!(
                        pick.pick_number,
                        next_needed, "pick arrived ahead of the log, buffering"
                    );
                }
                buffered.insert(pick.pick_number, pick);

                // Drain everything that is now contiguous.
                let mut advanced = false;
                while let Some(pick) = buffered.remove(&(applied.len() as u32 + 1)) {
                    info!(
                        pick.pick_number,
                        player = %pick.player_id,
                        driver = %pick.driver_id,
                        "pick applied"
                    );
                    applied.push(pick);
                    advanced = true;
                }
                if !advanced {
                    continue;
                }
            }
            DraftEvent::PickUndone => {
                if let Some(pick) = applied.pop() {
                    info!(pick.pick_number, driver = %pick.driver_id, "pick unwound");
                } else {
                    warn!("undo event with no applied picks");
                    continue;
                }
            }
        }

        let update = snapshot(engine, &applied);
        if updates.send(update).await.is_err() {
            break; // Nobody listening anymore.
        }
    }

    applied
}

/// Build the published view of the draft from the applied log.
fn snapshot(engine: &DraftEngine, applied: &[DraftPick]) -> DraftUpdate {
    let next = engine.current_pick(applied);
    DraftUpdate {
        phase: engine.phase(applied),
        picks_made: applied.len(),
        total_picks: engine.total_picks(),
        next_pick_number: next.map(|info| info.pick_number),
        on_clock: current_player(engine.roster(), applied, engine.rounds())
            .map(|p| p.id.clone()),
        remaining: engine.available(applied).len(),
    }
}
