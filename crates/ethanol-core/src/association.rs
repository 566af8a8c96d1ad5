// ── Association state machine ──
//
// Tracks one state per (station MAC, BSSID) relation. APs report each
// lifecycle step as a protocol event; the VAP's policy decides whether
// the step is allowed, and only allowed steps move the relation.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ethanol_proto::MessageType;
use ethanol_proto::codec::schema::event_mask;
use serde::Serialize;
use strum::{Display, EnumIter};

use crate::error::CoreError;
use crate::model::{MacAddress, Vap};

/// Where a station stands with respect to one VAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssociationState {
    Unassociated,
    Connecting,
    Authenticating,
    Associating,
    Associated,
    Reassociating,
    Disassociating,
    Disconnecting,
}

/// Lifecycle notification sent by an AP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssociationEvent {
    Connecting,
    Authenticating,
    Associating,
    Reassociating,
    Disassociating,
    Disconnecting,
}

impl AssociationEvent {
    pub fn from_message_type(message_type: MessageType) -> Option<Self> {
        match message_type {
            MessageType::UserConnecting => Some(Self::Connecting),
            MessageType::Authorization => Some(Self::Authenticating),
            MessageType::Association => Some(Self::Associating),
            MessageType::Reassociation => Some(Self::Reassociating),
            MessageType::Disassociation => Some(Self::Disassociating),
            MessageType::UserDisconnecting => Some(Self::Disconnecting),
            _ => None,
        }
    }

    pub fn message_type(self) -> MessageType {
        match self {
            Self::Connecting => MessageType::UserConnecting,
            Self::Authenticating => MessageType::Authorization,
            Self::Associating => MessageType::Association,
            Self::Reassociating => MessageType::Reassociation,
            Self::Disassociating => MessageType::Disassociation,
            Self::Disconnecting => MessageType::UserDisconnecting,
        }
    }

    /// Bit used to subscribe to this event with ENABLE_ASSOC_MSG.
    pub fn event_mask(self) -> u64 {
        match self {
            Self::Connecting => event_mask::USER_CONNECTING,
            Self::Authenticating => event_mask::AUTHORIZATION,
            Self::Associating => event_mask::ASSOCIATION,
            Self::Reassociating => event_mask::REASSOCIATION,
            Self::Disassociating => event_mask::DISASSOCIATION,
            Self::Disconnecting => event_mask::USER_DISCONNECTING,
        }
    }

    /// State the relation is in while the decision is pending.
    pub fn transient_state(self) -> AssociationState {
        match self {
            Self::Connecting => AssociationState::Connecting,
            Self::Authenticating => AssociationState::Authenticating,
            Self::Associating => AssociationState::Associating,
            Self::Reassociating => AssociationState::Reassociating,
            Self::Disassociating => AssociationState::Disassociating,
            Self::Disconnecting => AssociationState::Disconnecting,
        }
    }

    /// State the relation settles in once the step is allowed.
    pub fn settled_state(self) -> AssociationState {
        match self {
            Self::Connecting => AssociationState::Connecting,
            Self::Authenticating => AssociationState::Authenticating,
            Self::Associating | Self::Reassociating => AssociationState::Associated,
            Self::Disassociating | Self::Disconnecting => AssociationState::Unassociated,
        }
    }

    /// Whether this event is a legal next step from `from`.
    ///
    /// Authentication may start without a prior connecting event, since
    /// APs only report the events the controller subscribed to.
    pub fn accepts(self, from: AssociationState) -> bool {
        use AssociationState as S;
        match self {
            Self::Connecting => from == S::Unassociated,
            Self::Authenticating => matches!(from, S::Unassociated | S::Connecting),
            Self::Associating => from == S::Authenticating,
            Self::Reassociating | Self::Disassociating => from == S::Associated,
            Self::Disconnecting => true,
        }
    }

    /// Whether the reply's `response` field carries the decision.
    pub fn reports_response(self) -> bool {
        !matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

// ── Policy hooks ─────────────────────────────────────────────────────

/// Decision hooks consulted for each lifecycle step at one VAP.
///
/// Every hook allows by default; implement only the ones you need.
pub trait AssociationPolicy: Send + Sync {
    fn user_connecting(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn user_authenticating(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn user_associating(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn user_reassociating(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn user_disassociating(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn user_disconnecting(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    /// Pre-admission for a station about to be handed off to `vap`.
    fn admit_handoff(&self, _vap: &Vap, _station: &MacAddress) -> bool {
        true
    }

    fn decide(&self, event: AssociationEvent, vap: &Vap, station: &MacAddress) -> bool {
        match event {
            AssociationEvent::Connecting => self.user_connecting(vap, station),
            AssociationEvent::Authenticating => self.user_authenticating(vap, station),
            AssociationEvent::Associating => self.user_associating(vap, station),
            AssociationEvent::Reassociating => self.user_reassociating(vap, station),
            AssociationEvent::Disassociating => self.user_disassociating(vap, station),
            AssociationEvent::Disconnecting => self.user_disconnecting(vap, station),
        }
    }
}

/// Policy that allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AssociationPolicy for AllowAll {}

// ── Relation table ───────────────────────────────────────────────────

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub station: MacAddress,
    pub bssid: MacAddress,
    pub event: AssociationEvent,
    pub from: AssociationState,
    pub to: AssociationState,
    pub allowed: bool,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Relation state for every (station, BSSID) pair the controller has seen.
///
/// A missing entry means `Unassociated`.
#[derive(Debug, Default)]
pub struct AssociationTable {
    relations: DashMap<(MacAddress, MacAddress), AssociationState>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, station: &MacAddress, bssid: &MacAddress) -> AssociationState {
        self.relations
            .get(&(station.clone(), bssid.clone()))
            .map_or(AssociationState::Unassociated, |r| *r.value())
    }

    /// Apply `event` with the policy's answer `allowed`.
    ///
    /// A denied step leaves the relation where it was. An event that is
    /// not a legal next step is rejected and changes nothing.
    pub fn apply(
        &self,
        station: &MacAddress,
        bssid: &MacAddress,
        event: AssociationEvent,
        allowed: bool,
    ) -> Result<Transition, CoreError> {
        let key = (station.clone(), bssid.clone());
        let invalid = |from| CoreError::InvalidTransition {
            station: station.clone(),
            bssid: bssid.clone(),
            from,
            event,
        };
        let transition = |from, to| Transition {
            station: station.clone(),
            bssid: bssid.clone(),
            event,
            from,
            to,
            allowed,
        };

        match self.relations.entry(key) {
            Entry::Occupied(mut entry) => {
                let from = *entry.get();
                if !event.accepts(from) {
                    return Err(invalid(from));
                }
                if !allowed {
                    return Ok(transition(from, from));
                }
                let to = event.settled_state();
                if event == AssociationEvent::Disconnecting {
                    entry.remove();
                } else {
                    entry.insert(to);
                }
                Ok(transition(from, to))
            }
            Entry::Vacant(slot) => {
                let from = AssociationState::Unassociated;
                if event == AssociationEvent::Disconnecting || !event.accepts(from) {
                    return Err(invalid(from));
                }
                if !allowed {
                    return Ok(transition(from, from));
                }
                let to = event.settled_state();
                slot.insert(to);
                Ok(transition(from, to))
            }
        }
    }

    /// Record a completed move of `station` from `source` to `target`.
    pub fn move_station(
        &self,
        station: &MacAddress,
        source: Option<&MacAddress>,
        target: &MacAddress,
    ) {
        if let Some(source) = source {
            self.relations.remove(&(station.clone(), source.clone()));
        }
        self.relations.insert(
            (station.clone(), target.clone()),
            AssociationState::Associated,
        );
    }

    /// Forget every relation involving `bssid`.
    pub fn forget_bssid(&self, bssid: &MacAddress) {
        self.relations.retain(|(_, b), _| b != bssid);
    }

    /// Stations currently associated at `bssid`.
    pub fn associated_at(&self, bssid: &MacAddress) -> Vec<MacAddress> {
        let mut stations: Vec<MacAddress> = self
            .relations
            .iter()
            .filter(|r| &r.key().1 == bssid && *r.value() == AssociationState::Associated)
            .map(|r| r.key().0.clone())
            .collect();
        stations.sort();
        stations
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn sta() -> MacAddress {
        MacAddress::new("66:77:88:99:aa:bb")
    }

    fn bssid() -> MacAddress {
        MacAddress::new("00:11:22:33:44:55")
    }

    fn step(table: &AssociationTable, event: AssociationEvent, allowed: bool) -> Transition {
        table.apply(&sta(), &bssid(), event, allowed).unwrap()
    }

    #[test]
    fn allowed_steps_reach_associated() {
        let table = AssociationTable::new();
        step(&table, AssociationEvent::Connecting, true);
        step(&table, AssociationEvent::Authenticating, true);
        let last = step(&table, AssociationEvent::Associating, true);
        assert_eq!(last.from, AssociationState::Authenticating);
        assert_eq!(last.to, AssociationState::Associated);
        assert_eq!(table.associated_at(&bssid()), vec![sta()]);
    }

    #[test]
    fn denied_step_stops_progression() {
        let table = AssociationTable::new();
        step(&table, AssociationEvent::Connecting, true);
        let denied = step(&table, AssociationEvent::Authenticating, false);
        assert!(!denied.changed());
        assert_eq!(table.state(&sta(), &bssid()), AssociationState::Connecting);

        let err = table
            .apply(&sta(), &bssid(), AssociationEvent::Associating, true)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: AssociationState::Connecting,
                ..
            }
        ));
        assert_eq!(table.state(&sta(), &bssid()), AssociationState::Connecting);
    }

    #[test]
    fn reassociation_and_disassociation() {
        let table = AssociationTable::new();
        for event in [
            AssociationEvent::Authenticating,
            AssociationEvent::Associating,
            AssociationEvent::Reassociating,
        ] {
            step(&table, event, true);
        }
        assert_eq!(table.state(&sta(), &bssid()), AssociationState::Associated);

        step(&table, AssociationEvent::Disassociating, true);
        assert_eq!(table.state(&sta(), &bssid()), AssociationState::Unassociated);

        step(&table, AssociationEvent::Disconnecting, true);
        assert!(table.is_empty());
    }

    #[test]
    fn disconnect_without_relation_is_invalid() {
        let table = AssociationTable::new();
        assert!(
            table
                .apply(&sta(), &bssid(), AssociationEvent::Disconnecting, true)
                .is_err()
        );
        assert!(table.is_empty());
    }

    #[test]
    fn denied_first_step_records_nothing() {
        let table = AssociationTable::new();
        step(&table, AssociationEvent::Connecting, false);
        assert!(table.is_empty());
    }

    #[test]
    fn move_station_swaps_relations() {
        let table = AssociationTable::new();
        let target = MacAddress::new("00:11:22:33:44:66");
        table.move_station(&sta(), None, &bssid());
        table.move_station(&sta(), Some(&bssid()), &target);
        assert_eq!(table.state(&sta(), &bssid()), AssociationState::Unassociated);
        assert_eq!(table.state(&sta(), &target), AssociationState::Associated);
    }

    #[test]
    fn events_map_to_their_message_types() {
        for event in AssociationEvent::iter() {
            let message_type = event.message_type();
            assert!(message_type.is_association_event());
            assert_eq!(AssociationEvent::from_message_type(message_type), Some(event));
        }
        let all = AssociationEvent::iter().fold(0, |mask, e| mask | e.event_mask());
        assert_eq!(all, event_mask::ALL);
    }
}
