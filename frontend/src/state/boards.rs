use shared::{Board, BoardId, NewBoard};

use super::Command;
use crate::error::RemoteError;
use crate::feed::Feed;
use crate::remote::{ChangeEvent, FeedScope, RemoteService};

/// Board list of the signed-in user plus the board being viewed.
#[derive(Debug, Default)]
pub struct BoardStore {
    boards: Vec<Board>,
    active: Option<BoardId>,
    pub new_name: String,
    feed: Option<Feed<ChangeEvent>>,
    /// Bumped on every subscription so late fetches and notifications from a released feed are dropped.
    generation: u64,
}

impl BoardStore {
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn active(&self) -> Option<BoardId> {
        self.active
    }

    pub fn active_board(&self) -> Option<&Board> {
        let id = self.active?;
        self.boards.iter().find(|board| board.id == id)
    }

    pub fn is_subscribed(&self) -> bool {
        self.feed.is_some()
    }

    /// Loads the boards and subscribes to the boards collection for a newly present user.
    pub fn start<R: RemoteService>(&mut self, remote: &R) -> Vec<Command> {
        self.clear();
        self.subscribe(remote)
    }

    /// Opens a fresh feed and fetches the list it will keep current.
    fn subscribe<R: RemoteService>(&mut self, remote: &R) -> Vec<Command> {
        self.feed = None;
        self.generation += 1;
        let feed = remote.subscribe(FeedScope::Boards);
        let listener = feed.listener();
        self.feed = Some(feed);
        vec![
            Command::LoadBoards {
                generation: self.generation,
            },
            Command::ListenBoards {
                generation: self.generation,
                listener,
            },
        ]
    }

    /// Drops all board state and releases the subscription.
    pub fn clear(&mut self) {
        self.feed = None;
        self.boards.clear();
        self.active = None;
        self.new_name.clear();
    }

    pub fn loaded(&mut self, generation: u64, result: Result<Vec<Board>, RemoteError>) {
        if generation != self.generation {
            log::debug!("discarding board list of an earlier subscription");
            return;
        }
        match result {
            Ok(boards) => {
                log::debug!("loaded {} boards", boards.len());
                self.boards = boards;
            }
            Err(e) => log::warn!("failed to fetch boards: {}", e),
        }
    }

    /// Reacts to a boards-feed notification. `None` means the source closed the
    /// feed, which is reopened while the user is still present.
    pub fn on_change<R: RemoteService>(
        &mut self,
        remote: &R,
        generation: u64,
        event: Option<ChangeEvent>,
    ) -> Vec<Command> {
        let Some(feed) = self.feed.as_ref().filter(|_| generation == self.generation) else {
            return Vec::new();
        };
        match event {
            Some(event) => {
                log::debug!("boards changed ({:?}), refetching", event.kind);
                vec![
                    Command::LoadBoards { generation },
                    Command::ListenBoards {
                        generation,
                        listener: feed.listener(),
                    },
                ]
            }
            None => {
                log::info!("boards feed dropped, resubscribing");
                self.subscribe(remote)
            }
        }
    }

    /// The insert to issue for the typed name, if it is not blank.
    pub fn create(&self) -> Option<NewBoard> {
        let name = self.new_name.trim();
        if name.is_empty() {
            return None;
        }
        Some(NewBoard {
            name: name.to_string(),
        })
    }

    /// Records a confirmed insert and makes it the active board.
    pub fn created(&mut self, result: Result<Board, RemoteError>) -> Option<BoardId> {
        match result {
            Ok(board) => {
                let id = board.id;
                if !self.boards.iter().any(|known| known.id == id) {
                    self.boards.push(board);
                }
                self.new_name.clear();
                self.active = Some(id);
                Some(id)
            }
            Err(e) => {
                log::warn!("failed to create board: {}", e);
                None
            }
        }
    }

    /// Returns whether the active board changed.
    pub fn select(&mut self, id: BoardId) -> bool {
        if self.active == Some(id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn leave(&mut self) {
        self.active = None;
    }
}
