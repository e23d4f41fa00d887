use std::collections::VecDeque;

use kasane_types::WorkerResponse;
use tokio::sync::oneshot;

use crate::error::WorkerError;
use crate::framing::LineBuffer;

/// Completion handle for one in-flight request.
pub type Reply = oneshot::Sender<Result<WorkerResponse, WorkerError>>;

struct Pending {
    id: u64,
    reply: Reply,
}

/// What a single complete output line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Completed the request with this id.
    Resolved(u64),
    /// The worker's `{"ready":true}` announcement.
    Ready,
    /// Not JSON. Logged and dropped without touching the queue.
    Malformed,
    /// A response with nothing waiting for it.
    Unmatched,
}

/// Matches worker output lines to pending requests.
///
/// A response echoing a `requestId` completes that request and nothing else;
/// a response without one completes the oldest pending request, so without
/// ids ordering is strictly first-in first-out.
#[derive(Default)]
pub struct Correlator {
    pending: VecDeque<Pending>,
    buffer: LineBuffer,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, id: u64, reply: Reply) {
        self.pending.push_back(Pending { id, reply });
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed a raw stdout chunk, completing whatever requests it answers.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<LineEvent> {
        self.buffer
            .push(chunk)
            .iter()
            .map(|line| self.handle_line(line))
            .collect()
    }

    fn handle_line(&mut self, line: &str) -> LineEvent {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Dropping non-JSON worker line ({}): {}", e, truncate(line));
                return LineEvent::Malformed;
            }
        };

        if value.get("ready").and_then(|v| v.as_bool()) == Some(true) && value.get("success").is_none() {
            return LineEvent::Ready;
        }

        let echoed_id = value.get("requestId").and_then(|v| v.as_u64());
        let Some(pending) = self.take(echoed_id) else {
            tracing::warn!(
                "Worker response with no pending request (requestId {:?}), protocol out of sync",
                echoed_id
            );
            return LineEvent::Unmatched;
        };

        let result = serde_json::from_value::<WorkerResponse>(value)
            .map_err(|e| WorkerError::Protocol(format!("unexpected response shape: {e}")));
        if pending.reply.send(result).is_err() {
            tracing::debug!("Caller for request {} went away before its response", pending.id);
        }
        LineEvent::Resolved(pending.id)
    }

    /// An echoed id only ever completes its own request.
    fn take(&mut self, echoed_id: Option<u64>) -> Option<Pending> {
        match echoed_id {
            Some(id) => {
                let index = self.pending.iter().position(|p| p.id == id)?;
                self.pending.remove(index)
            }
            None => self.pending.pop_front(),
        }
    }

    /// Fail every pending request with [`WorkerError::Terminated`] and drop
    /// any partial output. Returns how many requests were failed.
    pub fn fail_all(&mut self) -> usize {
        let count = self.pending.len();
        for pending in self.pending.drain(..) {
            let _ = pending.reply.send(Err(WorkerError::Terminated));
        }
        self.buffer.clear();
        count
    }
}

fn truncate(line: &str) -> &str {
    match line.char_indices().nth(120) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot::Receiver;

    use super::*;

    type Rx = Receiver<Result<WorkerResponse, WorkerError>>;

    fn enqueue(correlator: &mut Correlator, id: u64) -> Rx {
        let (tx, rx) = oneshot::channel();
        correlator.enqueue(id, tx);
        rx
    }

    fn error_of(rx: &mut Rx) -> String {
        rx.try_recv().unwrap().unwrap().error.unwrap()
    }

    #[test]
    fn responses_resolve_in_submission_order() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);
        let mut b = enqueue(&mut c, 2);

        let events = c.feed(b"{\"success\":false,\"error\":\"first\"}\n");
        assert_eq!(events, vec![LineEvent::Resolved(1)]);
        // B stays pending however long the second line takes
        assert!(b.try_recv().is_err());

        c.feed(b"{\"success\":false,\"error\":\"second\"}\n");
        assert_eq!(error_of(&mut a), "first");
        assert_eq!(error_of(&mut b), "second");
        assert_eq!(c.pending_len(), 0);
    }

    #[test]
    fn response_split_across_chunks() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);

        assert!(c.feed(br#"{"success":true,"textBlocks":[{"x":10,"y":5,"#).is_empty());
        assert!(a.try_recv().is_err());

        let events = c.feed(
            "\"width\":80,\"height\":20,\"originalText\":\"あ\",\"translatedText\":\"a\"}]}\n".as_bytes(),
        );
        assert_eq!(events, vec![LineEvent::Resolved(1)]);
        let response = a.try_recv().unwrap().unwrap();
        assert_eq!(response.text_blocks.len(), 1);
        assert_eq!(response.text_blocks[0].translated_text, "a");
    }

    #[test]
    fn malformed_line_does_not_consume_a_slot() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);

        let events = c.feed(b"Loading OCR model...\n{\"success\":false,\"error\":\"x\"}\n");
        assert_eq!(events, vec![LineEvent::Malformed, LineEvent::Resolved(1)]);
        assert_eq!(error_of(&mut a), "x");
    }

    #[test]
    fn echoed_request_id_overrides_order() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);
        let mut b = enqueue(&mut c, 2);

        c.feed(b"{\"success\":false,\"error\":\"for b\",\"requestId\":2}\n");
        assert!(a.try_recv().is_err());
        assert_eq!(error_of(&mut b), "for b");

        c.feed(b"{\"success\":false,\"error\":\"for a\",\"requestId\":1}\n");
        assert_eq!(error_of(&mut a), "for a");
    }

    #[test]
    fn unknown_echoed_id_leaves_queue_alone() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);

        let events = c.feed(b"{\"success\":true,\"textBlocks\":[],\"requestId\":42}\n");
        assert_eq!(events, vec![LineEvent::Unmatched]);
        assert!(a.try_recv().is_err());
        assert_eq!(c.pending_len(), 1);

        c.feed(b"{\"success\":false,\"error\":\"mine\",\"requestId\":1}\n");
        assert_eq!(error_of(&mut a), "mine");
    }

    #[test]
    fn underflow_is_detected() {
        let mut c = Correlator::new();
        let events = c.feed(b"{\"success\":true,\"textBlocks\":[]}\n");
        assert_eq!(events, vec![LineEvent::Unmatched]);
    }

    #[test]
    fn ready_line_is_not_a_response() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);
        assert_eq!(c.feed(b"{\"ready\":true}\n"), vec![LineEvent::Ready]);
        assert!(a.try_recv().is_err());
        assert_eq!(c.pending_len(), 1);
    }

    #[test]
    fn wrong_shape_fails_oldest_with_protocol_error() {
        let mut c = Correlator::new();
        let mut a = enqueue(&mut c, 1);
        c.feed(b"{\"textBlocks\":3}\n");
        assert!(matches!(a.try_recv().unwrap(), Err(WorkerError::Protocol(_))));
    }

    #[test]
    fn fail_all_rejects_everything_and_clears() {
        let mut c = Correlator::new();
        let mut receivers: Vec<Rx> = (0..3).map(|id| enqueue(&mut c, id)).collect();
        c.feed(b"{\"success\":tr");

        assert_eq!(c.fail_all(), 3);
        assert_eq!(c.pending_len(), 0);
        for rx in receivers.iter_mut() {
            assert!(matches!(rx.try_recv().unwrap(), Err(WorkerError::Terminated)));
        }

        // the stale half line must not poison the next response
        let mut next = enqueue(&mut c, 9);
        c.feed(b"{\"success\":true,\"textBlocks\":[]}\n");
        assert!(next.try_recv().unwrap().unwrap().success);
    }

    #[test]
    fn dropped_caller_still_consumes_its_slot() {
        let mut c = Correlator::new();
        drop(enqueue(&mut c, 1));
        let mut b = enqueue(&mut c, 2);

        c.feed(b"{\"success\":false,\"error\":\"one\"}\n{\"success\":false,\"error\":\"two\"}\n");
        assert_eq!(error_of(&mut b), "two");
    }
}
