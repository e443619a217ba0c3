use std::collections::HashSet;

use dashmap::DashMap;
use inkroom_shared::SessionId;

use crate::peers::ConnectionId;

/// A connection leaving the session it was joined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    pub now_empty: bool,
}

/// Which connections sit in which room. A connection is in at most one room.
#[derive(Default)]
pub struct MembershipRegistry {
    rooms: DashMap<SessionId, HashSet<ConnectionId>>,
    joined: DashMap<ConnectionId, SessionId>,
}

impl MembershipRegistry {
    /// Returns the room the connection was moved out of, if it was in a
    /// different one.
    pub fn join(&self, session_id: &SessionId, connection: ConnectionId) -> Option<Departure> {
        let previous = self
            .joined
            .insert(connection, session_id.clone())
            .filter(|previous| previous != session_id);
        let departure = previous.map(|previous| {
            let now_empty = self.remove_from_room(&previous, connection);
            Departure {
                session_id: previous,
                now_empty,
            }
        });
        self.rooms
            .entry(session_id.clone())
            .or_default()
            .insert(connection);
        departure
    }

    pub fn leave(&self, connection: ConnectionId) -> Option<Departure> {
        let (_, session_id) = self.joined.remove(&connection)?;
        let now_empty = self.remove_from_room(&session_id, connection);
        Some(Departure {
            session_id,
            now_empty,
        })
    }

    pub fn members_of(&self, session_id: &SessionId) -> Vec<ConnectionId> {
        self.rooms
            .get(session_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, session_id: &SessionId) -> usize {
        self.rooms
            .get(session_id)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    pub fn session_of(&self, connection: ConnectionId) -> Option<SessionId> {
        self.joined
            .get(&connection)
            .map(|entry| entry.value().clone())
    }

    fn remove_from_room(&self, session_id: &SessionId, connection: ConnectionId) -> bool {
        let now_empty = match self.rooms.get_mut(session_id) {
            Some(mut members) => {
                members.remove(&connection);
                members.is_empty()
            }
            None => true,
        };
        if now_empty {
            self.rooms
                .remove_if(session_id, |_, members| members.is_empty());
        }
        now_empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(value: &str) -> SessionId {
        SessionId::parse(value).unwrap()
    }

    #[test]
    fn join_is_idempotent() {
        let registry = MembershipRegistry::default();
        let conn = ConnectionId::new();
        assert_eq!(registry.join(&sid("s1"), conn), None);
        assert_eq!(registry.join(&sid("s1"), conn), None);
        assert_eq!(registry.members_of(&sid("s1")), vec![conn]);
        assert_eq!(registry.session_of(conn), Some(sid("s1")));
    }

    #[test]
    fn joining_another_room_replaces_membership() {
        let registry = MembershipRegistry::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.join(&sid("s1"), a);
        registry.join(&sid("s1"), b);

        let departure = registry.join(&sid("s2"), a);
        assert_eq!(
            departure,
            Some(Departure {
                session_id: sid("s1"),
                now_empty: false,
            })
        );
        assert_eq!(registry.members_of(&sid("s1")), vec![b]);
        assert_eq!(registry.members_of(&sid("s2")), vec![a]);
    }

    #[test]
    fn leave_reports_empty_room() {
        let registry = MembershipRegistry::default();
        let conn = ConnectionId::new();
        registry.join(&sid("s1"), conn);
        assert_eq!(
            registry.leave(conn),
            Some(Departure {
                session_id: sid("s1"),
                now_empty: true,
            })
        );
        assert_eq!(registry.member_count(&sid("s1")), 0);
        assert_eq!(registry.session_of(conn), None);
    }

    #[test]
    fn leaving_without_joining_is_a_no_op() {
        let registry = MembershipRegistry::default();
        assert_eq!(registry.leave(ConnectionId::new()), None);
    }
}
