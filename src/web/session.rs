use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// 세션 아이디를 담는 쿠키 이름
pub const SESSION_COOKIE: &str = "BOOKS_SESSION";

/// 출판일 화면의 편집 상태
///
/// 목록 화면에 다시 들어와도 편집 중이던 출판일이 남아있다면 편집 폼을 채운 상태로 보여준다.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum EditState {
    #[default]
    Listing,
    Editing(u64),
}

impl EditState {
    pub fn editing_id(&self) -> Option<u64> {
        match self {
            EditState::Listing => None,
            EditState::Editing(id) => Some(*id),
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditState::Editing(_))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum FlashKind {
    Message,
    Error,
}

/// 리다이렉트 이후 한 번만 보여지는 메시지
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Flash {
    kind: FlashKind,
    text: String,
}

impl Flash {
    pub fn message(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Message, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: FlashKind::Error, text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

/// 사용자별 세션 상태
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Session {
    edit_state: EditState,
    flash: Option<Flash>,
}

impl Session {
    pub fn edit_state(&self) -> EditState {
        self.edit_state
    }

    pub fn start_editing(&mut self, id: u64) {
        self.edit_state = EditState::Editing(id);
    }

    pub fn stop_editing(&mut self) {
        self.edit_state = EditState::Listing;
    }

    pub fn set_flash(&mut self, flash: Flash) {
        self.flash = Some(flash);
    }

    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }

    pub fn is_empty(&self) -> bool {
        !self.edit_state.is_editing() && self.flash.is_none()
    }
}

/// 프로세스 메모리에 세션을 보관하는 저장소
///
/// 마지막 접근 이후 `ttl`이 지난 세션은 만료된 것으로 보고 읽지 않으며, 저장하거나
/// [`SessionStore::purge_expired`]를 호출할 때 제거된다.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

#[derive(Debug)]
struct Entry {
    session: Session,
    last_access: Instant,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// 쿠키로 받은 세션 아이디로 세션을 꺼낸다. 아이디가 없거나 알 수 없는 아이디, 만료된 세션이라면 새 세션을 만든다.
    pub fn load(&self, id: Option<Uuid>) -> (Uuid, Session) {
        self.load_at(id, Instant::now())
    }

    /// 상태가 남아있지 않은 세션은 저장하지 않는다.
    pub fn save(&self, id: Uuid, session: Session) {
        self.save_at(id, session, Instant::now())
    }

    /// 만료된 세션을 제거하고 제거한 개수를 반환한다.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn load_at(&self, id: Option<Uuid>, now: Instant) -> (Uuid, Session) {
        let sessions = self.lock();
        match id {
            Some(id) => {
                let session = sessions.get(&id)
                    .filter(|entry| !self.is_expired(entry, now))
                    .map(|entry| entry.session.clone())
                    .unwrap_or_default();
                (id, session)
            }
            None => (Uuid::new_v4(), Session::default()),
        }
    }

    fn save_at(&self, id: Uuid, session: Session, now: Instant) {
        let mut sessions = self.lock();
        sessions.retain(|_, entry| !self.is_expired(entry, now));

        if session.is_empty() {
            sessions.remove(&id);
        } else {
            sessions.insert(id, Entry { session, last_access: now });
        }
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        before - sessions.len()
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_access) > self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_listing_without_flash() {
        let mut session = Session::default();
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn editing_transitions() {
        let mut session = Session::default();

        session.start_editing(3);
        assert_eq!(session.edit_state(), EditState::Editing(3));
        assert_eq!(session.edit_state().editing_id(), Some(3));

        session.start_editing(5);
        assert_eq!(session.edit_state(), EditState::Editing(5));

        session.stop_editing();
        assert_eq!(session.edit_state(), EditState::Listing);
        assert_eq!(session.edit_state().editing_id(), None);
    }

    #[test]
    fn flash_is_shown_once() {
        let mut session = Session::default();
        session.set_flash(Flash::error("boom"));

        let flash = session.take_flash().unwrap();
        assert!(flash.is_error());
        assert_eq!(flash.text(), "boom");
        assert_eq!(session.take_flash(), None);
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn store_keeps_only_sessions_with_state() {
        let store = SessionStore::new(TTL);
        let (id, mut session) = store.load(None);

        store.save(id, session.clone());
        assert_eq!(store.len(), 0);

        session.start_editing(9);
        store.save(id, session);
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(Some(id)).1.edit_state(), EditState::Editing(9));

        let (_, mut session) = store.load(Some(id));
        session.stop_editing();
        store.save(id, session);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn unknown_session_id_starts_fresh() {
        let store = SessionStore::new(TTL);
        let id = Uuid::new_v4();

        let (loaded_id, session) = store.load(Some(id));

        assert_eq!(loaded_id, id);
        assert_eq!(session, Session::default());
    }

    #[test]
    fn idle_session_is_evicted_after_ttl() {
        let store = SessionStore::new(TTL);
        let start = Instant::now();
        let mut session = Session::default();
        session.start_editing(1);

        let idle = Uuid::new_v4();
        store.save_at(idle, session.clone(), start);
        let active = Uuid::new_v4();
        store.save_at(active, session, start + Duration::from_secs(50));

        let later = start + TTL + Duration::from_secs(1);
        assert_eq!(store.load_at(Some(idle), later).1, Session::default());
        assert_eq!(store.load_at(Some(active), later).1.edit_state(), EditState::Editing(1));

        assert_eq!(store.purge_expired_at(later), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn saving_sweeps_expired_sessions() {
        let store = SessionStore::new(TTL);
        let start = Instant::now();
        for id in 1..=3 {
            let mut session = Session::default();
            session.start_editing(id);
            store.save_at(Uuid::new_v4(), session, start);
        }

        let mut session = Session::default();
        session.set_flash(Flash::message("fresh"));
        store.save_at(Uuid::new_v4(), session, start + TTL * 2);

        assert_eq!(store.len(), 1);
    }
}
