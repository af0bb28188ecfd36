//! Store traits for the two durable collections, plus in-memory
//! implementations. Every trait method is a single atomic step from the
//! caller's perspective: the in-memory stores hold their lock for the whole
//! critical section, so `increment_balance` cannot lose updates and
//! `set_balance` is single-writer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{StoreError, StoreResult};
use crate::model::{self, Employee, EmployeeId, NewEmployee, Shift, ShiftId};
use crate::work_hours::round_hours;

/// Durable record of shift timestamps, looked up by employee and UTC
/// windows. Day-boundary policy lives with the callers ([`crate::config::OrgTimeZone`]);
/// the store only sees instants.
#[async_trait]
pub trait TimeRecordStore: Send + Sync {
    /// The open shift (no end timestamp) starting inside `[day_start, day_end)`,
    /// newest start first. The check-in guard makes more than one
    /// impossible; ordering is a safety net.
    async fn find_open_shift(
        &self,
        employee_id: EmployeeId,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> StoreResult<Option<Shift>>;

    /// Closed shifts starting inside `[from, until)`, ordered by start
    /// ascending. `from = None` means the beginning of history.
    async fn find_closed_shifts_in(
        &self,
        employee_id: EmployeeId,
        from: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Shift>>;

    async fn create_shift(&self, employee_id: EmployeeId, start: DateTime<Utc>)
        -> StoreResult<Shift>;

    /// Persists the mutated timestamps and the recomputed total. Callers
    /// must have already run [`Shift::recompute_total`].
    async fn update_shift(&self, shift: &Shift) -> StoreResult<Shift>;
}

/// Durable record of employees. Owns the running balance field; the
/// balance-mutating methods are the only writers of it.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>>;

    /// Active employees ordered by id.
    async fn list_active_employees(&self) -> StoreResult<Vec<Employee>>;

    /// Atomic store-level increment; never read-modify-write in caller
    /// code. Returns the updated employee, or None when the id is unknown.
    async fn increment_balance(
        &self,
        id: EmployeeId,
        delta: Decimal,
    ) -> StoreResult<Option<Employee>>;

    /// Overwrites the stored balance with an absolute value.
    async fn set_balance(&self, id: EmployeeId, value: Decimal) -> StoreResult<Option<Employee>>;

    /// Overwrites the stored balance with the value `compute` derives from
    /// a fresh read of the employee, read and write in one critical
    /// section. A concurrent target change cannot land between the two, so
    /// the computation never uses a stale weekly target.
    async fn update_balance_with(
        &self,
        id: EmployeeId,
        compute: Box<dyn for<'a> FnOnce(&'a Employee) -> Decimal + Send>,
    ) -> StoreResult<Option<Employee>>;

    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee>;

    async fn set_active(&self, id: EmployeeId, active: bool) -> StoreResult<Option<Employee>>;

    async fn set_weekly_hours(
        &self,
        id: EmployeeId,
        weekly_hours: Decimal,
    ) -> StoreResult<Option<Employee>>;
}

#[derive(Default)]
pub struct InMemoryTimeRecordStore {
    shifts: Mutex<HashMap<ShiftId, Shift>>,
    next_id: AtomicI64,
}

impl InMemoryTimeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimeRecordStore for InMemoryTimeRecordStore {
    async fn find_open_shift(
        &self,
        employee_id: EmployeeId,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> StoreResult<Option<Shift>> {
        let shifts = self.shifts.lock().unwrap();
        let mut open: Vec<&Shift> = shifts
            .values()
            .filter(|s| {
                s.employee_id == employee_id
                    && s.is_open()
                    && s.start >= day_start
                    && s.start < day_end
            })
            .collect();
        open.sort_by(|a, b| b.start.cmp(&a.start).then(b.id.cmp(&a.id)));
        Ok(open.first().map(|s| (*s).clone()))
    }

    async fn find_closed_shifts_in(
        &self,
        employee_id: EmployeeId,
        from: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Shift>> {
        let shifts = self.shifts.lock().unwrap();
        let mut closed: Vec<Shift> = shifts
            .values()
            .filter(|s| {
                s.employee_id == employee_id
                    && !s.is_open()
                    && from.map_or(true, |f| s.start >= f)
                    && s.start < until
            })
            .cloned()
            .collect();
        closed.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        Ok(closed)
    }

    async fn create_shift(
        &self,
        employee_id: EmployeeId,
        start: DateTime<Utc>,
    ) -> StoreResult<Shift> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let shift = Shift {
            id,
            employee_id,
            start,
            lunch_start: None,
            lunch_end: None,
            end: None,
            total_worked_hours: None,
        };
        self.shifts.lock().unwrap().insert(id, shift.clone());
        Ok(shift)
    }

    async fn update_shift(&self, shift: &Shift) -> StoreResult<Shift> {
        let mut shifts = self.shifts.lock().unwrap();
        if !shifts.contains_key(&shift.id) {
            return Err(StoreError::ShiftMissing(shift.id));
        }
        shifts.insert(shift.id, shift.clone());
        Ok(shift.clone())
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeDirectory {
    employees: Mutex<HashMap<EmployeeId, Employee>>,
    next_id: AtomicI64,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryEmployeeDirectory {
    async fn get_employee(&self, id: EmployeeId) -> StoreResult<Option<Employee>> {
        Ok(self.employees.lock().unwrap().get(&id).cloned())
    }

    async fn list_active_employees(&self) -> StoreResult<Vec<Employee>> {
        let employees = self.employees.lock().unwrap();
        let mut active: Vec<Employee> = employees.values().filter(|e| e.active).cloned().collect();
        active.sort_by_key(|e| e.id);
        Ok(active)
    }

    async fn increment_balance(
        &self,
        id: EmployeeId,
        delta: Decimal,
    ) -> StoreResult<Option<Employee>> {
        let mut employees = self.employees.lock().unwrap();
        Ok(employees.get_mut(&id).map(|employee| {
            employee.balance = round_hours(employee.balance + delta);
            employee.clone()
        }))
    }

    async fn set_balance(&self, id: EmployeeId, value: Decimal) -> StoreResult<Option<Employee>> {
        let mut employees = self.employees.lock().unwrap();
        Ok(employees.get_mut(&id).map(|employee| {
            employee.balance = round_hours(value);
            employee.clone()
        }))
    }

    async fn update_balance_with(
        &self,
        id: EmployeeId,
        compute: Box<dyn for<'a> FnOnce(&'a Employee) -> Decimal + Send>,
    ) -> StoreResult<Option<Employee>> {
        let mut employees = self.employees.lock().unwrap();
        Ok(employees.get_mut(&id).map(|employee| {
            employee.balance = round_hours(compute(employee));
            employee.clone()
        }))
    }

    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        if !model::weekly_hours_in_range(new.weekly_hours) {
            return Err(StoreError::WeeklyHoursOutOfRange(new.weekly_hours));
        }
        let mut employees = self.employees.lock().unwrap();
        if employees.values().any(|e| e.email == new.email) {
            return Err(StoreError::EmailTaken(new.email));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let employee = Employee {
            id,
            full_name: new.full_name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            weekly_hours: new.weekly_hours,
            balance: Decimal::ZERO,
            active: new.active,
        };
        employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn set_active(&self, id: EmployeeId, active: bool) -> StoreResult<Option<Employee>> {
        let mut employees = self.employees.lock().unwrap();
        Ok(employees.get_mut(&id).map(|employee| {
            employee.active = active;
            employee.clone()
        }))
    }

    async fn set_weekly_hours(
        &self,
        id: EmployeeId,
        weekly_hours: Decimal,
    ) -> StoreResult<Option<Employee>> {
        if !model::weekly_hours_in_range(weekly_hours) {
            return Err(StoreError::WeeklyHoursOutOfRange(weekly_hours));
        }
        let mut employees = self.employees.lock().unwrap();
        Ok(employees.get_mut(&id).map(|employee| {
            employee.weekly_hours = weekly_hours;
            employee.clone()
        }))
    }
}
