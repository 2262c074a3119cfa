use tracing::info;

#[derive(Debug)]
pub struct SearchStatistics {
    /// Number of nodes expanded across all bounded searches
    expanded_nodes: i32,
    /// Number of unique nodes generated
    generated_nodes: i32,
    /// Number of bounded searches run
    searches: i32,
    /// Number of learned heuristic updates applied
    heuristic_updates: i32,
    /// Number of states permanently marked as dead ends
    dead_ends_marked: i32,
    /// Number of reconnects triggered by the reactive layer
    reconnects: i32,
    /// Time when the agent started acting
    start_time: std::time::Instant,
    /// Time when the last log was printed, used for periodic logging
    last_log_time: std::time::Instant,
}

impl SearchStatistics {
    pub fn new() -> Self {
        Self {
            expanded_nodes: 0,
            generated_nodes: 0,
            searches: 0,
            heuristic_updates: 0,
            dead_ends_marked: 0,
            reconnects: 0,
            start_time: std::time::Instant::now(),
            last_log_time: std::time::Instant::now(),
        }
    }

    pub fn increment_expanded_nodes(&mut self) {
        self.expanded_nodes += 1;
        self.log_if_needed();
    }

    pub fn increment_generated_nodes(&mut self, num_nodes: usize) {
        self.generated_nodes += num_nodes as i32;
        self.log_if_needed();
    }

    pub fn increment_searches(&mut self) {
        self.searches += 1;
        self.log_if_needed();
    }

    pub fn increment_heuristic_updates(&mut self) {
        self.heuristic_updates += 1;
        self.log_if_needed();
    }

    pub fn increment_dead_ends_marked(&mut self) {
        self.dead_ends_marked += 1;
        self.log_if_needed();
    }

    pub fn increment_reconnects(&mut self) {
        self.reconnects += 1;
        self.log_if_needed();
    }

    pub fn expanded_nodes(&self) -> i32 {
        self.expanded_nodes
    }

    pub fn dead_ends_marked(&self) -> i32 {
        self.dead_ends_marked
    }

    pub fn reconnects(&self) -> i32 {
        self.reconnects
    }

    fn log_if_needed(&mut self) {
        if self.last_log_time.elapsed().as_secs() > 10 {
            self.log();
        }
    }

    pub fn log(&mut self) {
        self.last_log_time = std::time::Instant::now();
        info!(
            expanded_nodes = self.expanded_nodes,
            generated_nodes = self.generated_nodes,
            searches = self.searches,
            heuristic_updates = self.heuristic_updates,
            dead_ends_marked = self.dead_ends_marked,
            reconnects = self.reconnects,
        );
    }

    pub fn finalise(&mut self) {
        self.log();
        info!(agent_duration = self.start_time.elapsed().as_secs_f64());
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
