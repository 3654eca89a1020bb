//! Channel builtins.
//!
//! Channels live in a table keyed by integer handle; handle `0` is the nil
//! channel. A task that cannot proceed records what it is waiting for,
//! parks, and yields. Whoever completes the operation (a matching send or
//! receive, or `close`) fills in the record and schedules the task; the
//! task then replays the builtin call, which finds the record settled and
//! returns.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::{block_on_nil_handle, handle_arg, park_current};
use crate::errors::{
    channel_would_block, close_of_closed_channel, close_of_nil_channel, invalid_channel_handle,
    negative_channel_capacity, send_on_closed_channel, task_cancelled,
};
use crate::task::TaskHandle;
use crate::{ControlAction, EvalError, EvalResult, Interpreter, Value};

struct SendWaiter {
    task: TaskHandle,
    value: Value,
}

pub(crate) struct ChannelState {
    capacity: usize,
    queue: VecDeque<Value>,
    closed: bool,
    send_waiters: VecDeque<SendWaiter>,
    receive_waiters: VecDeque<TaskHandle>,
}

impl ChannelState {
    fn new(capacity: usize) -> Self {
        ChannelState {
            capacity,
            queue: VecDeque::new(),
            closed: false,
            send_waiters: VecDeque::new(),
            receive_waiters: VecDeque::new(),
        }
    }

    fn has_room(&self) -> bool {
        self.capacity > 0 && self.queue.len() < self.capacity
    }

    fn forget(&mut self, task: &TaskHandle) {
        self.send_waiters.retain(|w| !w.task.ptr_eq(task));
        self.receive_waiters.retain(|t| !t.ptr_eq(task));
    }
}

/// A blocked send, keyed by task id.
struct PendingSend {
    channel: i64,
    delivered: bool,
    error: Option<EvalError>,
}

/// A blocked receive, keyed by task id.
struct PendingReceive {
    channel: i64,
    /// `Some` once a value (or `Nil` after close) was handed over.
    delivered: Option<Value>,
}

/// Handle → channel state, plus the wait records of blocked tasks.
pub struct ChannelTable {
    next_handle: i64,
    channels: FxHashMap<i64, ChannelState>,
    sends: FxHashMap<u64, PendingSend>,
    receives: FxHashMap<u64, PendingReceive>,
}

impl Default for ChannelTable {
    fn default() -> Self {
        ChannelTable {
            next_handle: 1,
            channels: FxHashMap::default(),
            sends: FxHashMap::default(),
            receives: FxHashMap::default(),
        }
    }
}

impl ChannelTable {
    pub(crate) fn create(&mut self, capacity: usize) -> i64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.channels.insert(handle, ChannelState::new(capacity));
        handle
    }

    fn get(&mut self, handle: i64) -> Result<&mut ChannelState, EvalError> {
        self.channels
            .get_mut(&handle)
            .ok_or_else(invalid_channel_handle)
    }

    /// Number of live channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Hand `value` to the first waiting receiver, returning it to wake.
    fn deliver_to_receiver(
        &mut self,
        handle: i64,
        value: &Value,
    ) -> Result<Option<TaskHandle>, EvalError> {
        let Some(receiver) = self.get(handle)?.receive_waiters.pop_front() else {
            return Ok(None);
        };
        if let Some(pending) = self.receives.get_mut(&receiver.id()) {
            if pending.channel == handle {
                pending.delivered = Some(value.clone());
            }
        }
        Ok(Some(receiver))
    }

    /// Take the next value without blocking. Also returns a sender to wake.
    fn take_ready(
        &mut self,
        handle: i64,
    ) -> Result<Option<(Value, Option<TaskHandle>)>, EvalError> {
        let state = self.get(handle)?;
        if let Some(value) = state.queue.pop_front() {
            // A buffered slot just opened: move the oldest blocked sender in.
            let woken = if state.capacity > 0 {
                state.send_waiters.pop_front().map(|waiter| {
                    state.queue.push_back(waiter.value);
                    waiter.task
                })
            } else {
                None
            };
            if let Some(task) = &woken {
                self.mark_delivered(handle, task);
            }
            return Ok(Some((value, woken)));
        }
        if let Some(waiter) = state.send_waiters.pop_front() {
            self.mark_delivered(handle, &waiter.task);
            return Ok(Some((waiter.value, Some(waiter.task))));
        }
        Ok(None)
    }

    fn mark_delivered(&mut self, handle: i64, sender: &TaskHandle) {
        if let Some(pending) = self.sends.get_mut(&sender.id()) {
            if pending.channel == handle {
                pending.delivered = true;
            }
        }
    }

    /// Mark closed and return every blocked task to wake.
    fn close(&mut self, handle: i64) -> Result<Vec<TaskHandle>, EvalError> {
        let state = self.get(handle)?;
        if state.closed {
            return Err(close_of_closed_channel());
        }
        state.closed = true;
        let receivers: Vec<_> = state.receive_waiters.drain(..).collect();
        let senders: Vec<_> = state.send_waiters.drain(..).map(|w| w.task).collect();
        for receiver in &receivers {
            if let Some(pending) = self.receives.get_mut(&receiver.id()) {
                if pending.channel == handle {
                    pending.delivered = Some(Value::Nil);
                }
            }
        }
        for sender in &senders {
            if let Some(pending) = self.sends.get_mut(&sender.id()) {
                if pending.channel == handle {
                    pending.error = Some(send_on_closed_channel());
                }
            }
        }
        Ok(receivers.into_iter().chain(senders).collect())
    }

    /// Drop everything `task` is waiting on.
    fn forget(&mut self, task: &TaskHandle) {
        self.sends.remove(&task.id());
        self.receives.remove(&task.id());
        for state in self.channels.values_mut() {
            state.forget(task);
        }
    }
}

fn capacity_arg(value: &Value) -> Result<usize, EvalError> {
    let capacity = handle_arg(value)?;
    usize::try_from(capacity).map_err(|_| negative_channel_capacity(capacity))
}

/// `__able_channel_new(capacity)`
pub(super) fn channel_new(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let capacity = capacity_arg(&args[0])?;
    let handle = interp.channels.create(capacity);
    tracing::trace!(handle, capacity, "channel created");
    Ok(Value::Int(handle))
}

/// `__able_channel_send(handle, value)`
pub(super) fn channel_send(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return block_on_nil_handle(interp, "send");
    }
    let value = args[1].clone();
    let current = interp.current_task();

    if let Some(task) = &current {
        if let Some(pending) = interp.channels.sends.remove(&task.id()) {
            if pending.channel == handle {
                if let Some(err) = pending.error {
                    return Err(err.into());
                }
                if pending.delivered {
                    return Ok(Value::Nil);
                }
            }
        }
        if task.cancel_requested() {
            interp.channels.forget(task);
            return Err(task_cancelled(task.kind()).into());
        }
    }

    let state = interp.channels.get(handle)?;
    if state.closed {
        return Err(send_on_closed_channel().into());
    }
    let rendezvous = state.capacity == 0;
    if let Some(receiver) = interp.channels.deliver_to_receiver(handle, &value)? {
        interp.schedule_task(&receiver);
        // A rendezvous sender still yields once so the receiver runs first.
        if let (true, Some(task)) = (rendezvous, &current) {
            interp.channels.sends.insert(
                task.id(),
                PendingSend {
                    channel: handle,
                    delivered: true,
                    error: None,
                },
            );
            return Err(ControlAction::Yield);
        }
        return Ok(Value::Nil);
    }
    let state = interp.channels.get(handle)?;
    if state.has_room() {
        state.queue.push_back(value);
        return Ok(Value::Nil);
    }

    let Some(task) = current else {
        return Err(channel_would_block("send").into());
    };
    match state.send_waiters.iter_mut().find(|w| w.task.ptr_eq(&task)) {
        Some(waiter) => waiter.value = value,
        None => state.send_waiters.push_back(SendWaiter {
            task: task.clone(),
            value,
        }),
    }
    interp.channels.sends.insert(
        task.id(),
        PendingSend {
            channel: handle,
            delivered: false,
            error: None,
        },
    );
    park_current(&task)
}

/// `__able_channel_receive(handle)`
pub(super) fn channel_receive(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return block_on_nil_handle(interp, "receive");
    }
    let current = interp.current_task();

    if let Some(task) = &current {
        if let Some(pending) = interp.channels.receives.remove(&task.id()) {
            if pending.channel == handle {
                if let Some(value) = pending.delivered {
                    return Ok(value);
                }
            }
        }
        if task.cancel_requested() {
            interp.channels.forget(task);
            return Err(task_cancelled(task.kind()).into());
        }
    }

    if let Some((value, sender)) = interp.channels.take_ready(handle)? {
        if let Some(sender) = sender {
            interp.schedule_task(&sender);
        }
        return Ok(value);
    }
    let state = interp.channels.get(handle)?;
    if state.closed {
        return Ok(Value::Nil);
    }

    let Some(task) = current else {
        return Err(channel_would_block("receive").into());
    };
    if !state.receive_waiters.iter().any(|t| t.ptr_eq(&task)) {
        state.receive_waiters.push_back(task.clone());
    }
    interp.channels.receives.insert(
        task.id(),
        PendingReceive {
            channel: handle,
            delivered: None,
        },
    );
    park_current(&task)
}

/// `__able_channel_try_send(handle, value)`
pub(super) fn channel_try_send(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return Ok(Value::Bool(false));
    }
    if interp.channels.get(handle)?.closed {
        return Err(send_on_closed_channel().into());
    }
    if let Some(receiver) = interp.channels.deliver_to_receiver(handle, &args[1])? {
        interp.schedule_task(&receiver);
        return Ok(Value::Bool(true));
    }
    let state = interp.channels.get(handle)?;
    if state.has_room() {
        state.queue.push_back(args[1].clone());
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(false))
}

/// `__able_channel_try_receive(handle)`
pub(super) fn channel_try_receive(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return Ok(Value::Nil);
    }
    match interp.channels.take_ready(handle)? {
        Some((value, sender)) => {
            if let Some(sender) = sender {
                interp.schedule_task(&sender);
            }
            Ok(value)
        }
        None => Ok(Value::Nil),
    }
}

/// `__able_channel_close(handle)`
pub(super) fn channel_close(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return Err(close_of_nil_channel().into());
    }
    let woken = interp.channels.close(handle)?;
    tracing::trace!(handle, woken = woken.len(), "channel closed");
    for task in &woken {
        interp.schedule_task(task);
    }
    Ok(Value::Nil)
}

/// `__able_channel_is_closed(handle)`
pub(super) fn channel_is_closed(interp: &mut Interpreter, args: &[Value]) -> EvalResult {
    let handle = handle_arg(&args[0])?;
    if handle == 0 {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(interp.channels.get(handle)?.closed))
}
