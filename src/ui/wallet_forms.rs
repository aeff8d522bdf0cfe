//! Forms behind the staking and access key pages. Each form is an
//! [`ActionRunner`]; this module only lays them out and keeps one set of forms
//! per held key.

use eframe::egui::{ComboBox, Grid, RichText, Ui};
use ethers::types::{H256, U256};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use crate::domain::{AccessKey, Asset, ExtensionRates};
use crate::ui::action_form::ActionRunner;
use crate::ui::app_context::AppContext;
use crate::ui::config::{UI_CONFIG, UI_TEXT};
use crate::ui::styles::UiStyleExt;
use crate::ui::utils::card_frame;
use crate::wallet::{ActionEvent, ActionKind, format_amount};

pub struct StakingForms {
    stake: ActionRunner,
    unstake: ActionRunner,
}

impl Default for StakingForms {
    fn default() -> Self {
        Self {
            stake: ActionRunner::new(ActionKind::Stake),
            unstake: ActionRunner::new(ActionKind::Unstake),
        }
    }
}

impl StakingForms {
    pub fn poll(&mut self) -> Vec<ActionEvent> {
        [self.stake.poll(), self.unstake.poll()].into_iter().flatten().collect()
    }

    pub fn on_tx_settled(&mut self, hash: H256) {
        self.stake.on_tx_settled(hash);
        self.unstake.on_tx_settled(hash);
    }

    pub fn on_snapshot_refreshed(&mut self) {
        self.stake.on_snapshot_refreshed();
        self.unstake.on_snapshot_refreshed();
    }

    pub fn is_busy(&self) -> bool {
        self.stake.is_busy() || self.unstake.is_busy()
    }

    pub fn show(&mut self, ui: &mut Ui, app: &AppContext) {
        let ctx = app.action_context();
        let wallet = app.wallet();
        let staking = &app.snapshot().staking;

        ui.horizontal_wrapped(|ui| {
            card_frame().show(ui, |ui| {
                ui.set_width(260.0);
                ui.label_subheader(UI_TEXT.stake_heading);
                ui.metric(
                    "CMK",
                    &format_amount(ctx.balances.cmk, Asset::Cmk.decimals()),
                    UI_CONFIG.colors.label,
                );
                self.stake.show(ui, "stake", &ctx, wallet);
            });

            card_frame().show(ui, |ui| {
                ui.set_width(260.0);
                ui.label_subheader(UI_TEXT.unstake_heading);
                ui.metric(
                    "xCMK",
                    &format_amount(ctx.balances.xcmk, Asset::Xcmk.decimals()),
                    UI_CONFIG.colors.label,
                );
                self.unstake.show(ui, "unstake", &ctx, wallet);
            });

            card_frame().show(ui, |ui| {
                ui.set_width(260.0);
                ui.label_subheader(UI_TEXT.staking_pool_heading);
                let decimals = Asset::Cmk.decimals();
                ui.metric(
                    UI_TEXT.staking_total_shares,
                    &format_amount(staking.total_shares, decimals),
                    UI_CONFIG.colors.heading,
                );
                ui.metric(
                    UI_TEXT.staking_cmk_per_share,
                    &format_amount(staking.cmk_per_share, decimals),
                    UI_CONFIG.colors.heading,
                );
                ui.metric(
                    UI_TEXT.staking_shares_per_cmk,
                    &format_amount(staking.shares_per_cmk, decimals),
                    UI_CONFIG.colors.heading,
                );
            });
        });
    }
}

/// Add CMK, extend expiry and burn for one key.
struct KeyForms {
    add_cmk: ActionRunner,
    extend: ActionRunner,
    burn: ActionRunner,
    extend_days: u64,
    payment: Asset,
    /// Cost last written into the extend form, so a user edit is not overwritten every frame
    prefilled: Option<(Asset, u64, U256)>,
}

impl KeyForms {
    fn new(token_id: U256) -> Self {
        let payment = Asset::Cmk;
        Self {
            add_cmk: ActionRunner::new(ActionKind::AddCmk { token_id }),
            extend: ActionRunner::new(ActionKind::ExtendExpiry { token_id, payment }),
            burn: ActionRunner::new(ActionKind::BurnKey { token_id }),
            extend_days: UI_CONFIG.extension_days[1],
            payment,
            prefilled: None,
        }
    }

    fn runners_mut(&mut self) -> [&mut ActionRunner; 3] {
        [&mut self.add_cmk, &mut self.extend, &mut self.burn]
    }

    fn is_busy(&self) -> bool {
        self.add_cmk.is_busy() || self.extend.is_busy() || self.burn.is_busy()
    }

    fn poll(&mut self) -> Vec<ActionEvent> {
        let extended = self.extend.poll();
        if matches!(extended, Some(ActionEvent::Submitted { .. })) {
            // The submit cleared the amount; write the cost back next frame
            self.prefilled = None;
        }
        [self.add_cmk.poll(), extended, self.burn.poll()].into_iter().flatten().collect()
    }

    /// Writes the extension cost into the extend form when the inputs changed.
    fn prefill_extension(&mut self, token_id: U256, rates: &ExtensionRates) {
        let cost = rates.cost(self.payment, self.extend_days);
        let key = (self.payment, self.extend_days, cost);
        if self.prefilled == Some(key) || self.extend.is_busy() {
            return;
        }
        self.extend.set_kind(ActionKind::ExtendExpiry {
            token_id,
            payment: self.payment,
        });
        self.extend.set_amount(format_amount(cost, self.payment.decimals()));
        self.prefilled = Some(key);
    }
}

pub struct AccessKeyForms {
    mint: ActionRunner,
    keys: BTreeMap<U256, KeyForms>,
}

impl Default for AccessKeyForms {
    fn default() -> Self {
        Self {
            mint: ActionRunner::new(ActionKind::MintKey),
            keys: BTreeMap::new(),
        }
    }
}

impl AccessKeyForms {
    /// Keeps one set of forms per held key. Forms of a key that disappeared
    /// are kept while they still have a transaction in flight.
    pub fn sync(&mut self, held: &[AccessKey]) {
        for key in held {
            self.keys
                .entry(key.token_id)
                .or_insert_with(|| KeyForms::new(key.token_id));
        }
        self.keys
            .retain(|id, forms| forms.is_busy() || held.iter().any(|k| k.token_id == *id));
    }

    pub fn poll(&mut self) -> Vec<ActionEvent> {
        let mut events: Vec<ActionEvent> = self.mint.poll().into_iter().collect();
        for forms in self.keys.values_mut() {
            events.extend(forms.poll());
        }
        events
    }

    pub fn on_tx_settled(&mut self, hash: H256) {
        self.mint.on_tx_settled(hash);
        for forms in self.keys.values_mut() {
            for runner in forms.runners_mut() {
                runner.on_tx_settled(hash);
            }
        }
    }

    pub fn on_snapshot_refreshed(&mut self) {
        self.mint.on_snapshot_refreshed();
        for forms in self.keys.values_mut() {
            for runner in forms.runners_mut() {
                runner.on_snapshot_refreshed();
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.mint.is_busy() || self.keys.values().any(KeyForms::is_busy)
    }

    pub fn show(&mut self, ui: &mut Ui, app: &AppContext) {
        let ctx = app.action_context();
        let wallet = app.wallet();

        card_frame().show(ui, |ui| {
            ui.label_subheader(UI_TEXT.mint_heading);
            ui.metric(
                "CMK",
                &format_amount(ctx.balances.cmk, Asset::Cmk.decimals()),
                UI_CONFIG.colors.label,
            );
            self.mint.show(ui, "mint", &ctx, wallet);
        });

        ui.add_space(10.0);
        ui.label_subheader(UI_TEXT.keys_heading);

        let held = &app.snapshot().access_keys;
        if held.is_empty() {
            ui.label_subdued(UI_TEXT.keys_empty);
            return;
        }

        for key in held {
            let Some(forms) = self.keys.get_mut(&key.token_id) else {
                continue;
            };
            forms.prefill_extension(key.token_id, &app.snapshot().rates);
            let salt = key.token_id.to_string();

            card_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("Key #{}", key.token_id)).strong());
                    let decimals = Asset::Cmk.decimals();
                    ui.metric(UI_TEXT.key_deposit, &format_amount(key.cmk_value, decimals), UI_CONFIG.colors.heading);
                    ui.metric(UI_TEXT.key_fees, &format_amount(key.fees_accumulated, decimals), UI_CONFIG.colors.negative);
                    ui.metric(UI_TEXT.key_net, &format_amount(key.net_value(), decimals), UI_CONFIG.colors.positive);
                });

                Grid::new(("key_forms", salt.as_str()))
                    .num_columns(3)
                    .spacing([24.0, 6.0])
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            ui.label_subdued("Add CMK");
                            forms.add_cmk.show(ui, &format!("add_{}", salt), &ctx, wallet);
                        });

                        ui.vertical(|ui| {
                            ui.label_subdued("Extend expiry");
                            ui.horizontal(|ui| {
                                ui.label_subdued(UI_TEXT.extend_days);
                                for days in UI_CONFIG.extension_days {
                                    ui.selectable_value(&mut forms.extend_days, days, days.to_string());
                                }
                            });
                            ComboBox::from_id_salt(("pay_with", salt.as_str()))
                                .selected_text(format!("{} {}", UI_TEXT.extend_pay_with, forms.payment))
                                .show_ui(ui, |ui| {
                                    for asset in Asset::iter() {
                                        ui.selectable_value(&mut forms.payment, asset, asset.to_string());
                                    }
                                });
                            let cost = app.snapshot().rates.cost(forms.payment, forms.extend_days);
                            ui.metric(
                                UI_TEXT.extend_cost,
                                &format!("{} {}", format_amount(cost, forms.payment.decimals()), forms.payment),
                                UI_CONFIG.colors.pending,
                            );
                            forms.extend.show(ui, &format!("extend_{}", salt), &ctx, wallet);
                        });

                        ui.vertical(|ui| {
                            ui.label_subdued("Burn");
                            forms.burn.show(ui, &format!("burn_{}", salt), &ctx, wallet);
                        });
                        ui.end_row();
                    });
            });
            ui.add_space(6.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::reads::Allowance;
    use crate::wallet::reads::tests::sample_addresses;
    use crate::wallet::testing::MockWallet;
    use crate::wallet::{ActionContext, Balances, WalletProvider};
    use ethers::types::Address;
    use std::sync::Arc;
    use std::time::Duration;

    fn key(id: u64) -> AccessKey {
        AccessKey {
            token_id: U256::from(id),
            cmk_value: U256::from(1_000),
            fees_accumulated: U256::from(10),
        }
    }

    #[test]
    fn forms_follow_the_held_keys() {
        let mut forms = AccessKeyForms::default();
        forms.sync(&[key(1), key(2)]);
        assert_eq!(forms.keys.len(), 2);

        forms.sync(&[key(2)]);
        assert_eq!(forms.keys.keys().copied().collect::<Vec<_>>(), vec![U256::from(2)]);
    }

    #[test]
    fn new_key_forms_target_their_key() {
        let forms = KeyForms::new(U256::from(7));
        assert_eq!(
            forms.burn.action().kind(),
            ActionKind::BurnKey {
                token_id: U256::from(7)
            }
        );
        assert_eq!(
            forms.extend.action().kind(),
            ActionKind::ExtendExpiry {
                token_id: U256::from(7),
                payment: Asset::Cmk
            }
        );
        assert!(!forms.is_busy());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn extension_cost_is_written_back_after_a_submit() {
        let owner = Address::from_low_u64_be(0xaa);
        let addresses = sample_addresses();
        let balances = Balances {
            cmk: U256::exp10(21),
            allowances: vec![Allowance {
                token: addresses.cmk,
                spender: addresses.access_factory,
                amount: U256::MAX,
            }],
            ..Balances::default()
        };
        let ctx = ActionContext {
            account: Some(owner),
            addresses: Some(&addresses),
            balances: &balances,
        };
        let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::new(owner, 1));
        let rates = ExtensionRates {
            cmk_per_sec: U256::from(1_000),
            ..ExtensionRates::default()
        };

        let mut forms = KeyForms::new(U256::from(7));
        forms.prefill_extension(U256::from(7), &rates);
        let prefilled = forms.extend.action().amount_input.clone();
        assert!(!prefilled.is_empty());

        assert!(forms.extend.click(&ctx, &wallet));
        let mut events = Vec::new();
        for _ in 0..300 {
            events = forms.poll();
            if !events.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matches!(events.as_slice(), [ActionEvent::Submitted { .. }]));
        assert!(forms.extend.action().amount_input.is_empty());

        forms.prefill_extension(U256::from(7), &rates);
        assert_eq!(forms.extend.action().amount_input, prefilled);
    }
}
