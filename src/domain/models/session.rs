#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub sequence: u64,
}

impl Session {
    pub fn new(id: &str) -> Session {
        return Session {
            id: id.to_string(),
            sequence: 0,
        };
    }

    /// Reserves the sequence id for the next outbound message. The first
    /// message of a session is 1.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        return self.sequence;
    }
}

/// Owns the single active agent session. Every reset bumps `version`, and
/// async completions carry the version they were issued under so late
/// responses for a discarded session can be recognised and dropped.
#[derive(Debug, Default)]
pub struct SessionContext {
    session: Option<Session>,
    version: u64,
}

impl SessionContext {
    pub fn version(&self) -> u64 {
        return self.version;
    }

    pub fn is_current(&self, version: u64) -> bool {
        return self.version == version;
    }

    pub fn session(&self) -> Option<&Session> {
        return self.session.as_ref();
    }

    /// Drops any session and sequence state, returning the new version to
    /// tag the upcoming open request with.
    pub fn reset(&mut self) -> u64 {
        self.session = None;
        self.version += 1;
        return self.version;
    }

    /// Installs a freshly opened session if `version` is still current.
    pub fn attach(&mut self, version: u64, session: Session) -> bool {
        if !self.is_current(version) {
            return false;
        }

        self.session = Some(session);
        return true;
    }

    /// Returns the session id and the sequence id reserved for the next
    /// message.
    pub fn next_message(&mut self) -> Option<(String, u64)> {
        return self.session.as_mut().map(|session| {
            let sequence = session.next_sequence();
            return (session.id.to_string(), sequence);
        });
    }

    /// Removes the session, invalidating anything still in flight for it.
    pub fn take(&mut self) -> Option<Session> {
        self.version += 1;
        return self.session.take();
    }
}
