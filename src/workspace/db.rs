//! Spatial index of connections
//!
//! One database per role, each a vector kept sorted by y so a radius search
//! only scans the band `[y - r, y + r]` outward from the origin.

use std::collections::HashSet;

use crate::layout::Point;

use super::connection::{ConnectionRef, ConnectionRole};
use super::Workspace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DbEntry {
    pub position: Point,
    pub connection: ConnectionRef,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionDb {
    entries: Vec<DbEntry>,
}

impl ConnectionDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DbEntry] {
        &self.entries
    }

    pub fn add(&mut self, connection: ConnectionRef, position: Point) {
        let index = self.entries.partition_point(|e| e.position.y <= position.y);
        self.entries.insert(
            index,
            DbEntry {
                position,
                connection,
            },
        );
    }

    pub fn remove(&mut self, connection: ConnectionRef) -> bool {
        match self.entries.iter().position(|e| e.connection == connection) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Move an entry to a new position, keeping the y ordering
    pub fn relocate(&mut self, connection: ConnectionRef, position: Point) {
        self.remove(connection);
        self.add(connection, position);
    }

    /// Closest entry within `max_radius` of `origin` that passes `allowed`.
    /// Ties keep whichever entry was found first.
    pub fn search_for_closest<F>(
        &self,
        origin: Point,
        max_radius: f64,
        mut allowed: F,
    ) -> Option<(ConnectionRef, f64)>
    where
        F: FnMut(ConnectionRef) -> bool,
    {
        if self.entries.is_empty() {
            return None;
        }
        let start = self.entries.partition_point(|e| e.position.y < origin.y);
        let mut best: Option<(ConnectionRef, f64)> = None;
        let mut best_radius = max_radius;

        let mut consider = |entry: &DbEntry, best: &mut Option<(ConnectionRef, f64)>| {
            let distance = entry.position.distance(origin);
            let closer = distance <= best_radius && (best.is_none() || distance < best_radius);
            if closer && allowed(entry.connection) {
                *best = Some((entry.connection, distance));
                best_radius = distance;
            }
        };

        // Downwards from the origin's row, then upwards
        for entry in &self.entries[start..] {
            if entry.position.y - origin.y > max_radius {
                break;
            }
            consider(entry, &mut best);
        }
        for entry in self.entries[..start].iter().rev() {
            if origin.y - entry.position.y > max_radius {
                break;
            }
            consider(entry, &mut best);
        }
        best
    }

    /// Every entry within `radius` of `origin`
    pub fn neighbours(&self, origin: Point, radius: f64) -> Vec<ConnectionRef> {
        let start = self
            .entries
            .partition_point(|e| e.position.y < origin.y - radius);
        self.entries[start..]
            .iter()
            .take_while(|e| e.position.y <= origin.y + radius)
            .filter(|e| e.position.distance(origin) <= radius)
            .map(|e| e.connection)
            .collect()
    }
}

/// The four per-role databases of a workspace
#[derive(Debug, Clone, Default)]
pub struct ConnectionDbs {
    output: ConnectionDb,
    input: ConnectionDb,
    previous: ConnectionDb,
    next: ConnectionDb,
}

impl ConnectionDbs {
    pub fn get(&self, role: ConnectionRole) -> &ConnectionDb {
        match role {
            ConnectionRole::Output => &self.output,
            ConnectionRole::Input => &self.input,
            ConnectionRole::Previous => &self.previous,
            ConnectionRole::Next => &self.next,
        }
    }

    pub fn get_mut(&mut self, role: ConnectionRole) -> &mut ConnectionDb {
        match role {
            ConnectionRole::Output => &mut self.output,
            ConnectionRole::Input => &mut self.input,
            ConnectionRole::Previous => &mut self.previous,
            ConnectionRole::Next => &mut self.next,
        }
    }
}

impl Workspace {
    /// Index database holding connections of `role`
    pub fn connection_db(&self, role: ConnectionRole) -> &ConnectionDb {
        self.dbs.get(role)
    }

    /// Closest connection that `local` could be joined to within `radius`.
    ///
    /// Candidates must pass [`Workspace::is_connection_allowed`]; `dragging`
    /// holds the connections travelling with the dragged stack.
    pub fn nearest(
        &self,
        local: ConnectionRef,
        radius: f64,
        dragging: &HashSet<ConnectionRef>,
    ) -> Option<(ConnectionRef, f64)> {
        let connection = self.connection(local)?;
        let db = self.dbs.get(connection.role.opposite());
        let found = db.search_for_closest(connection.position, radius, |candidate| {
            self.is_connection_allowed(local, candidate, dragging)
        });
        tracing::trace!(%local, radius, ?found, "nearest connection search");
        found
    }

    /// Opposite-role connections within `radius` of `local`
    pub fn neighbours(&self, local: ConnectionRef, radius: f64) -> Vec<ConnectionRef> {
        match self.connection(local) {
            Some(connection) => self
                .dbs
                .get(connection.role.opposite())
                .neighbours(connection.position, radius),
            None => Vec::new(),
        }
    }
}
