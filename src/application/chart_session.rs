use crate::application::config::ChartConfig;
use crate::domain::chart::ViewportStateManager;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Bar, OverlayPoint, OverlaySeries, Symbol};
use crate::infrastructure::dto::StockPayloadDto;

/// Handle for one in-flight fetch. Only the newest ticket may apply data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    symbol: Symbol,
}

impl LoadTicket {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { bars: usize, overlays: usize },
    /// A newer load was started; the payload was discarded.
    Superseded,
}

/// One chart pane: the viewport manager plus the symbol it shows.
///
/// Picking another symbol while a fetch is still running must not let the
/// older response overwrite the newer one, so every load is tagged with a
/// generation number.
#[derive(Debug)]
pub struct ChartSession {
    config: ChartConfig,
    manager: ViewportStateManager<Bar>,
    overlays: Vec<OverlaySeries>,
    current: Option<Symbol>,
    pending: Option<LoadTicket>,
    generation: u64,
}

impl ChartSession {
    pub fn new(config: ChartConfig) -> Self {
        let config = config.validated();
        Self {
            manager: config.build_manager(),
            config,
            overlays: Vec::new(),
            current: None,
            pending: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn manager(&self) -> &ViewportStateManager<Bar> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ViewportStateManager<Bar> {
        &mut self.manager
    }

    pub fn current_symbol(&self) -> Option<&Symbol> {
        self.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `symbol`, superseding any load still in flight.
    pub fn begin_load(&mut self, symbol: Symbol) -> LoadTicket {
        self.generation = self.generation.wrapping_add(1);
        if let Some(previous) = self.pending.take() {
            crate::log_debug!(
                LogComponent::Application("ChartSession"),
                "load of {} superseded by {}",
                previous.symbol,
                symbol
            );
        }
        let ticket = LoadTicket { generation: self.generation, symbol };
        self.pending = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.pending.as_ref() == Some(ticket)
    }

    /// Apply a fetched payload if `ticket` is still the newest load.
    pub fn complete_load(&mut self, ticket: &LoadTicket, payload: &StockPayloadDto) -> ChartResult<LoadOutcome> {
        if !self.is_current(ticket) {
            return Ok(LoadOutcome::Superseded);
        }
        self.pending = None;

        let snapshot = payload.to_snapshot(&self.config.overlays)?;
        if snapshot.symbol != ticket.symbol {
            return Err(ChartError::Payload(format!(
                "requested {} but received {}",
                ticket.symbol, snapshot.symbol
            )));
        }

        let switched = self.current.as_ref() != Some(&snapshot.symbol);
        if switched && self.manager.crosshair_index().is_some() {
            self.manager.clear_crosshair();
        }

        let outcome = LoadOutcome::Applied { bars: snapshot.bars.len(), overlays: snapshot.overlays.len() };
        self.manager.set_data(snapshot.bars);
        self.overlays = snapshot.overlays;
        self.current = Some(snapshot.symbol);

        crate::log_info!(LogComponent::Application("ChartSession"), "{} loaded: {:?}", ticket.symbol, outcome);
        Ok(outcome)
    }

    /// Same as [`complete_load`](Self::complete_load) for a raw response body.
    pub fn complete_load_json(&mut self, ticket: &LoadTicket, json: &str) -> ChartResult<LoadOutcome> {
        if !self.is_current(ticket) {
            return Ok(LoadOutcome::Superseded);
        }
        match StockPayloadDto::from_json(json) {
            Ok(payload) => self.complete_load(ticket, &payload),
            Err(err) => {
                self.pending = None;
                Err(err)
            }
        }
    }

    /// Record a failed fetch. Stale failures are ignored, like stale data.
    pub fn fail_load(&mut self, ticket: &LoadTicket, reason: &str) {
        if self.is_current(ticket) {
            self.pending = None;
            crate::log_warn!(
                LogComponent::Application("ChartSession"),
                "load of {} failed: {}",
                ticket.symbol,
                reason
            );
        }
    }

    pub fn overlays(&self) -> &[OverlaySeries] {
        &self.overlays
    }

    /// Each overlay clipped to the time span of the visible bars.
    pub fn visible_overlays(&self) -> Vec<(&OverlaySeries, &[OverlayPoint])> {
        let visible = self.manager.visible_data();
        let first = visible.iter().find_map(|b| b.time);
        let last = visible.iter().rev().find_map(|b| b.time);
        let (Some(first), Some(last)) = (first, last) else {
            return Vec::new();
        };
        self.overlays.iter().map(|o| (o, o.window(first, last))).collect()
    }
}

impl Default for ChartSession {
    fn default() -> Self {
        Self::new(ChartConfig::default())
    }
}
