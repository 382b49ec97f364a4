//! Waiting queue of one station plus the lock that serializes scheduling
//! decisions against it.
//!
//! Many events can land on the same simulated instant (an arrival and a charge
//! completion, two arrivals, ...). Each of them wants to look at the queue and
//! maybe pop a vehicle. The [`SchedulingLock`] makes that check-then-pop
//! sequence exclusive: whoever holds the lock decides, everyone else waits in
//! FIFO order and is handed the lock on release.
//!
//! Waiting vehicles are kept in arrival order and ranked by the station's
//! [`ChargingPolicy`], or, for [`ChargingPolicyKind::DualStack`], served from
//! a [`DualStack`].

use std::collections::{HashSet, VecDeque};

use bevy_ecs::prelude::Entity;

use crate::error::StationError;
use crate::policy::{ChargingPolicy, ChargingPolicyKind};

/// Why a scheduling decision was requested, and for which vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockHolder {
    /// Vehicle arrived and wants a slot.
    Arrival(Entity),
    /// Vehicle finished charging and freed its slot.
    SlotFreed(Entity),
    /// Vehicle's user is leaving; the vehicle is withdrawn or unplugged.
    Departure(Entity),
    /// Initial fill of a station that starts with vehicles queued.
    Startup,
}

impl LockHolder {
    pub fn vehicle(&self) -> Option<Entity> {
        match *self {
            LockHolder::Arrival(v) | LockHolder::SlotFreed(v) | LockHolder::Departure(v) => Some(v),
            LockHolder::Startup => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Caller holds the lock and may decide now.
    Acquired,
    /// Caller already held the lock; its pending decision covers this request.
    AlreadyHeld,
    /// Caller is queued and will be handed the lock by a later release.
    Queued,
}

/// Cooperative single-holder mutex with FIFO hand-off.
#[derive(Debug, Clone, Default)]
pub struct SchedulingLock {
    holder: Option<LockHolder>,
    waiters: VecDeque<LockHolder>,
}

impl SchedulingLock {
    /// Acquire, or queue behind the current holder. Re-acquiring by the
    /// current holder changes nothing.
    pub fn acquire(&mut self, holder: LockHolder) -> LockOutcome {
        match self.holder {
            None => {
                self.holder = Some(holder);
                LockOutcome::Acquired
            }
            Some(current) if current == holder => LockOutcome::AlreadyHeld,
            Some(_) => {
                self.waiters.push_back(holder);
                LockOutcome::Queued
            }
        }
    }

    /// Release and hand the lock to the longest waiter, which is returned so
    /// the caller can resume it.
    pub fn release(&mut self, holder: LockHolder) -> Result<Option<LockHolder>, StationError> {
        if self.holder != Some(holder) {
            return Err(StationError::LockNotHeld);
        }
        self.holder = self.waiters.pop_front();
        Ok(self.holder)
    }

    pub fn holder(&self) -> Option<LockHolder> {
        self.holder
    }

    pub fn is_held_by(&self, holder: LockHolder) -> bool {
        self.holder == Some(holder)
    }

    pub fn is_locked(&self) -> bool {
        self.holder.is_some()
    }

    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }
}

/// Two bounded stacks: arrivals go on the insert stack, vehicles are served
/// from the top of the remove stack. The roles swap when the insert stack
/// reaches its size while the storage still has room, or when the remove
/// stack runs empty.
///
/// The sizes are swap thresholds; the storage capacity (their sum) is the
/// hard bound, so a stack may hold more than its size once the other one
/// is being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualStack {
    stacks: [Vec<Entity>; 2],
    sizes: [usize; 2],
    insert: usize,
}

impl DualStack {
    pub fn new(stack1_size: usize, stack2_size: usize) -> Self {
        Self {
            stacks: [Vec::new(), Vec::new()],
            sizes: [stack1_size, stack2_size],
            insert: 0,
        }
    }

    pub fn sizes(&self) -> (usize, usize) {
        (self.sizes[0], self.sizes[1])
    }

    pub fn capacity(&self) -> usize {
        self.sizes[0] + self.sizes[1]
    }

    pub fn len(&self) -> usize {
        self.stacks[0].len() + self.stacks[1].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self) -> usize {
        1 - self.insert
    }

    pub fn insert_stack(&self) -> &[Entity] {
        &self.stacks[self.insert]
    }

    pub fn remove_stack(&self) -> &[Entity] {
        &self.stacks[self.remove()]
    }

    fn swap(&mut self) {
        self.insert = self.remove();
    }

    /// Keep something servable on the remove stack while anything waits.
    fn rebalance(&mut self) {
        if self.stacks[self.remove()].is_empty() && !self.stacks[self.insert].is_empty() {
            self.swap();
        }
    }

    pub fn push(&mut self, vehicle: Entity) {
        let insert = self.insert;
        self.stacks[insert].push(vehicle);
        let insert_full = self.stacks[insert].len() >= self.sizes[insert];
        if (insert_full && self.len() < self.capacity()) || self.stacks[self.remove()].is_empty() {
            self.swap();
        }
    }

    /// Top of the remove stack, then top of the insert stack.
    pub fn peek(&self) -> Option<Entity> {
        self.stacks[self.remove()]
            .last()
            .or_else(|| self.stacks[self.insert].last())
            .copied()
    }

    pub fn pop(&mut self) -> Option<Entity> {
        let remove = self.remove();
        let vehicle = match self.stacks[remove].pop() {
            Some(vehicle) => vehicle,
            None => self.stacks[self.insert].pop()?,
        };
        self.rebalance();
        Some(vehicle)
    }

    pub fn withdraw(&mut self, vehicle: Entity) -> bool {
        let found = self.stacks.iter().enumerate().find_map(|(s, stack)| {
            stack.iter().position(|&v| v == vehicle).map(|index| (s, index))
        });
        let Some((s, index)) = found else {
            return false;
        };
        self.stacks[s].remove(index);
        self.rebalance();
        true
    }

    /// Seed an empty storage: the first `stack1_size` vehicles fill stack 1,
    /// which is served first, the rest go on stack 2. A non-empty storage
    /// takes them as ordinary arrivals.
    pub fn deploy(&mut self, vehicles: &[Entity]) {
        if !self.is_empty() {
            vehicles.iter().for_each(|&v| self.push(v));
            return;
        }
        let split = self.sizes[0].min(vehicles.len());
        self.stacks[0] = vehicles[..split].to_vec();
        self.stacks[1] = vehicles[split..].to_vec();
        self.insert = 1;
        self.rebalance();
    }
}

/// Vehicles waiting to charge at one station.
///
/// Invariant: `count() <= capacity()`.
#[derive(Debug, Clone)]
pub struct StationStorage {
    capacity: usize,
    policy: ChargingPolicyKind,
    /// Arrival order, earliest first.
    waiting: Vec<Entity>,
    /// Service order for [`ChargingPolicyKind::DualStack`]; mirrors `waiting`.
    stacks: Option<DualStack>,
    /// Popped to charge and not yet reported `charged`.
    dispatched: HashSet<Entity>,
    lock: SchedulingLock,
}

impl StationStorage {
    /// A dual-stack storage splits `capacity` evenly, the odd place going to
    /// stack 1. Use [`StationStorage::dual_stack`] to size the stacks.
    pub fn new(capacity: usize, policy: ChargingPolicyKind) -> Self {
        match policy {
            ChargingPolicyKind::DualStack => Self::dual_stack(capacity.div_ceil(2), capacity / 2),
            _ => Self::with_stacks(capacity, policy, None),
        }
    }

    pub fn dual_stack(stack1_size: usize, stack2_size: usize) -> Self {
        let stacks = DualStack::new(stack1_size, stack2_size);
        Self::with_stacks(stacks.capacity(), ChargingPolicyKind::DualStack, Some(stacks))
    }

    fn with_stacks(capacity: usize, policy: ChargingPolicyKind, stacks: Option<DualStack>) -> Self {
        Self {
            capacity,
            policy,
            waiting: Vec::with_capacity(capacity),
            stacks,
            dispatched: HashSet::new(),
            lock: SchedulingLock::default(),
        }
    }

    pub fn fifo(capacity: usize) -> Self {
        Self::new(capacity, ChargingPolicyKind::Fifo)
    }

    pub fn lifo(capacity: usize) -> Self {
        Self::new(capacity, ChargingPolicyKind::Lifo)
    }

    pub fn policy(&self) -> ChargingPolicyKind {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.waiting.len() >= self.capacity
    }

    /// Waiting vehicles in arrival order.
    pub fn waiting(&self) -> &[Entity] {
        &self.waiting
    }

    pub fn contains(&self, vehicle: Entity) -> bool {
        self.waiting.contains(&vehicle)
    }

    pub fn is_dispatched(&self, vehicle: Entity) -> bool {
        self.dispatched.contains(&vehicle)
    }

    pub fn stacks(&self) -> Option<&DualStack> {
        self.stacks.as_ref()
    }

    pub fn add_vehicle(&mut self, vehicle: Entity) -> Result<(), StationError> {
        if self.is_full() {
            return Err(StationError::CapacityViolation {
                vehicle,
                capacity: self.capacity,
            });
        }
        if self.contains(vehicle) {
            return Err(StationError::AlreadyQueued(vehicle));
        }
        self.waiting.push(vehicle);
        if let Some(stacks) = &mut self.stacks {
            stacks.push(vehicle);
        }
        Ok(())
    }

    /// Seed the queue at setup. All-or-nothing.
    pub fn deploy(&mut self, vehicles: &[Entity]) -> Result<(), StationError> {
        if let Some(&overflow) = vehicles.get(self.capacity.saturating_sub(self.count())) {
            return Err(StationError::CapacityViolation {
                vehicle: overflow,
                capacity: self.capacity,
            });
        }
        if let Some(&duplicate) = vehicles
            .iter()
            .enumerate()
            .find(|&(i, v)| self.contains(*v) || vehicles[..i].contains(v))
            .map(|(_, v)| v)
        {
            return Err(StationError::AlreadyQueued(duplicate));
        }
        self.waiting.extend_from_slice(vehicles);
        if let Some(stacks) = &mut self.stacks {
            stacks.deploy(vehicles);
        }
        Ok(())
    }

    /// Peek at the vehicle `pop_vehicle` would return.
    pub fn next_vehicle_to_charge(&self) -> Option<Entity> {
        match &self.stacks {
            Some(stacks) => stacks.peek(),
            None => self.policy.policy().next_vehicle_to_charge(&self.waiting),
        }
    }

    /// Remove the next vehicle to charge per the policy.
    pub fn pop_vehicle(&mut self) -> Option<Entity> {
        let vehicle = match &mut self.stacks {
            Some(stacks) => {
                let vehicle = stacks.pop()?;
                self.waiting.retain(|&v| v != vehicle);
                vehicle
            }
            None => {
                let index = self.policy.policy().next_index(&self.waiting)?;
                self.waiting.remove(index)
            }
        };
        self.dispatched.insert(vehicle);
        Some(vehicle)
    }

    /// Whether `vehicle`, arriving now, would be served ahead of every
    /// vehicle already waiting.
    pub fn serves_arrival_first(&self, vehicle: Entity) -> bool {
        match &self.stacks {
            // An arrival lands on the insert stack, behind the remove stack.
            Some(stacks) => stacks.is_empty(),
            None => {
                let mut candidates = self.waiting.clone();
                candidates.push(vehicle);
                self.policy.policy().next_vehicle_to_charge(&candidates) == Some(vehicle)
            }
        }
    }

    /// Drop a waiting vehicle whose user gave up. Returns whether it was queued.
    pub fn withdraw(&mut self, vehicle: Entity) -> bool {
        match self.waiting.iter().position(|&v| v == vehicle) {
            Some(index) => {
                self.waiting.remove(index);
                if let Some(stacks) = &mut self.stacks {
                    stacks.withdraw(vehicle);
                }
                true
            }
            None => false,
        }
    }

    /// A dispatched vehicle finished its charging cycle (or was unplugged).
    /// Returns whether the station may reschedule, i.e. something is waiting.
    pub fn charged(&mut self, vehicle: Entity) -> bool {
        self.dispatched.remove(&vehicle);
        !self.waiting.is_empty()
    }

    /// True iff a vehicle waits and the station has a free slot.
    pub fn need_reschedule(&self, free_slots: usize) -> bool {
        free_slots > 0 && !self.waiting.is_empty()
    }

    pub fn lock(&mut self, holder: LockHolder) -> LockOutcome {
        self.lock.acquire(holder)
    }

    pub fn unlock(&mut self, holder: LockHolder) -> Result<Option<LockHolder>, StationError> {
        self.lock.release(holder)
    }

    pub fn lock_holder(&self) -> Option<LockHolder> {
        self.lock.holder()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn is_locked_by(&self, holder: LockHolder) -> bool {
        self.lock.is_held_by(holder)
    }

    pub fn lock_waiters(&self) -> usize {
        self.lock.waiting()
    }
}
