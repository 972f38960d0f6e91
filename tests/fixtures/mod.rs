//! Shared payloads and executors for the built-in workflows
#![allow(dead_code)]

use std::collections::BTreeMap;

use anyhow::{anyhow, bail};
use tollgate::{Preset, TransitionExecutor, TransitionInfo};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub total_cents: u64,
    pub paid_cents: u64,
    pub refunded_cents: u64,
    pub tracking_number: Option<String>,
}

/// Order executor: shipping needs full payment and a tracking number,
/// cancelling a paid order refunds it.
pub fn order_executor() -> TransitionExecutor<Order> {
    TransitionExecutor::builder(Preset::Order.registry().unwrap())
        .guard("paid", "ship", "order is not fully paid", |order: &Order| {
            order.paid_cents >= order.total_cents
        })
        .guard("paid", "ship", "missing tracking number", |order: &Order| {
            order.tracking_number.is_some()
        })
        .on_transition("paid", "cancel", |order: &mut Order, _: &TransitionInfo<'_>| {
            order.refunded_cents = order.paid_cents;
            Ok(())
        })
        .build()
        .unwrap()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendingMachine {
    pub balance_cents: u64,
    /// item -> (price, count)
    pub inventory: BTreeMap<String, (u64, u32)>,
    pub selected: Option<String>,
    pub dispensed: Vec<String>,
    pub returned_cents: u64,
}

impl VendingMachine {
    pub fn stocked() -> Self {
        let mut inventory = BTreeMap::new();
        inventory.insert("cola".to_string(), (150, 2));
        inventory.insert("water".to_string(), (100, 0));
        inventory.insert("chips".to_string(), (250, 5));
        Self {
            inventory,
            ..Default::default()
        }
    }

    fn selected_price(&self) -> Option<u64> {
        self.selected
            .as_ref()
            .and_then(|item| self.inventory.get(item))
            .map(|(price, _)| *price)
    }
}

/// Vending machine executor: selection needs enough credit and stock,
/// dispensing takes the item and returns change.
pub fn vending_executor() -> TransitionExecutor<VendingMachine> {
    TransitionExecutor::builder(Preset::VendingMachine.registry().unwrap())
        .guard("has_funds", "select", "unknown item", |vm: &VendingMachine| {
            vm.selected_price().is_some()
        })
        .guard("has_funds", "select", "insufficient funds", |vm: &VendingMachine| {
            vm.selected_price().is_some_and(|price| vm.balance_cents >= price)
        })
        .guard("has_funds", "select", "item sold out", |vm: &VendingMachine| {
            vm.selected
                .as_ref()
                .and_then(|item| vm.inventory.get(item))
                .is_some_and(|(_, count)| *count > 0)
        })
        .on_transition("dispensing", "dispense", |vm: &mut VendingMachine, _: &TransitionInfo<'_>| {
            let item = vm.selected.take().ok_or_else(|| anyhow!("nothing selected"))?;
            let (price, count) = vm
                .inventory
                .get_mut(&item)
                .ok_or_else(|| anyhow!("unknown item {item}"))?;
            if *count == 0 {
                bail!("{item} is sold out");
            }
            *count -= 1;
            vm.balance_cents -= *price;
            vm.dispensed.push(item);
            Ok(())
        })
        .on_enter("idle", |vm: &mut VendingMachine, _: &TransitionInfo<'_>| {
            vm.returned_cents += vm.balance_cents;
            vm.balance_cents = 0;
            Ok(())
        })
        .build()
        .unwrap()
}

pub fn insert(cents: u64) -> impl FnOnce(&mut VendingMachine) -> anyhow::Result<()> {
    move |vm| {
        if cents == 0 {
            bail!("no coins inserted");
        }
        vm.balance_cents += cents;
        Ok(())
    }
}

pub fn select(item: &str) -> impl FnOnce(&mut VendingMachine) -> anyhow::Result<()> {
    let item = item.to_string();
    move |vm| {
        vm.selected = Some(item);
        Ok(())
    }
}
