use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    Arrival,
    ServiceCompletion { server_id: usize },
    RepairCompletion { server_id: usize },
    Breakdown { server_id: usize },
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Arrival => f.write_str("arrival"),
            EventKind::ServiceCompletion { server_id } => {
                write!(f, "service-completion(server {})", server_id)
            }
            EventKind::RepairCompletion { server_id } => {
                write!(f, "repair-completion(server {})", server_id)
            }
            EventKind::Breakdown { server_id } => write!(f, "breakdown(server {})", server_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledEvent {
    pub time: f64,
    pub kind: EventKind,
}

impl ScheduledEvent {
    pub fn new(time: f64, kind: EventKind) -> Self {
        Self { time, kind }
    }
}

/// The next instant of each event category. `None` means the category
/// has nothing pending and compares as later than any finite time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventCandidates {
    pub arrival: f64,
    pub service: Option<(usize, f64)>,
    pub repair: Option<(usize, f64)>,
    pub breakdown: Option<(usize, f64)>,
}

impl EventCandidates {
    /// Picks the next event with strict comparisons checked in the order
    /// arrival, service completion, repair completion, breakdown.
    ///
    /// On an exact tie the earlier category's check fails, so the later
    /// category wins: an arrival at the same instant as a service completion
    /// resolves to the completion.
    pub fn resolve(&self) -> ScheduledEvent {
        let service = time_of(self.service);
        let repair = time_of(self.repair);
        let breakdown = time_of(self.breakdown);
        let arrival = self.arrival;

        if arrival < service && arrival < repair && arrival < breakdown {
            return ScheduledEvent::new(arrival, EventKind::Arrival);
        }
        if let Some((server_id, time)) = self.service {
            if time < repair && time < breakdown {
                return ScheduledEvent::new(time, EventKind::ServiceCompletion { server_id });
            }
        }
        if let Some((server_id, time)) = self.repair {
            if time < breakdown {
                return ScheduledEvent::new(time, EventKind::RepairCompletion { server_id });
            }
        }
        match self.breakdown {
            Some((server_id, time)) => {
                ScheduledEvent::new(time, EventKind::Breakdown { server_id })
            }
            // Only reachable when the arrival time itself is not finite.
            None => ScheduledEvent::new(arrival, EventKind::Arrival),
        }
    }
}

fn time_of(candidate: Option<(usize, f64)>) -> f64 {
    candidate.map_or(f64::INFINITY, |(_, time)| time)
}
