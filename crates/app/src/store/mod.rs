//! Cart store.
//!
//! The canonical owner of the shopper's cart session: line items, the
//! applied coupon, any held lucky prize, and the lottery-mode lock. Every
//! mutation checks the lock first, merges by `(id, size)`, re-enforces the
//! prize floor, and round-trips the session to device storage. Hydration is
//! defensive: absent or corrupt records become empty state, never errors.

use std::sync::Arc;

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use sillage::{
    config::PricingConfig,
    coupons::Coupon,
    items::{LineItem, Size},
    lottery::LotteryMode,
    pricing::{self, PricingError, Quote},
    prize::LuckyPrize,
};
use tracing::{debug, warn};

use crate::storage::{
    CART_KEY, COUPON_KEY, LOTTERY_KEY, StorageBackend,
    records::{CartRecord, LineItemRecord, LotteryRecord},
};

mod errors;

pub use errors::CartError;

/// Observer of settled cart changes, used to wire the abandoned-cart
/// recovery sync without coupling the store to an async runtime.
pub trait CartChangeListener: Send + Sync {
    /// Called after every settled mutation with the current lines.
    fn cart_changed(&self, items: &[LineItem]);
}

/// A catalogue snapshot handed to the store when a line is added. The price
/// is frozen at this moment; brand, category and stock are cached for
/// coupon eligibility and stock validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    /// Product identifier.
    pub id: String,

    /// Chosen size.
    pub size: Size,

    /// Unit price at add time.
    pub unit_price: Money<'static, Currency>,

    /// Brand, for coupon eligibility.
    pub brand: String,

    /// Category, for coupon eligibility.
    pub category: String,

    /// Stock ceiling in millilitres, when the catalogue knows it.
    pub stock_ml: Option<u32>,
}

/// The cart session owner.
pub struct CartStore<S: StorageBackend> {
    items: Vec<LineItem>,
    coupon: Option<Coupon>,
    prize: Option<LuckyPrize>,
    lottery: LotteryMode,
    config: PricingConfig,
    storage: S,
    listener: Option<Arc<dyn CartChangeListener>>,
}

impl<S: StorageBackend> CartStore<S> {
    /// An empty cart backed by `storage`.
    pub fn new(storage: S, config: PricingConfig) -> Self {
        Self {
            items: Vec::new(),
            coupon: None,
            prize: None,
            lottery: LotteryMode::Inactive,
            config,
            storage,
            listener: None,
        }
    }

    /// Hydrate a cart from storage.
    ///
    /// Each record is parsed independently; anything absent or corrupt is
    /// logged and treated as empty state. A persisted lottery session whose
    /// expiry has already passed is discarded on the spot.
    pub fn load(storage: S, config: PricingConfig, now: Timestamp) -> Self {
        let mut store = Self::new(storage, config);

        store.hydrate(now);
        store
    }

    /// Attach a settled-change listener (e.g. the recovery-sync debouncer).
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn CartChangeListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Current lines, in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The applied coupon, if any.
    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    /// The held lucky prize, if any.
    pub fn prize(&self) -> Option<&LuckyPrize> {
        self.prize.as_ref()
    }

    /// Current lottery mode.
    pub fn lottery(&self) -> LotteryMode {
        self.lottery
    }

    /// The pricing configuration this cart prices against.
    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Borrow the storage backend (tests use this to clone a snapshot).
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Raw item subtotal of the current lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] on a currency mismatch.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, CartError> {
        Ok(pricing::subtotal(&self.items, self.config.currency)
            .map_err(PricingError::from)?)
    }

    /// Add one unit of a product, merging into an existing `(id, size)` line.
    ///
    /// On a merge the quantity increments and the cached brand, category and
    /// stock are refreshed; the snapshotted unit price is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] during a lottery session, or a
    /// persistence error.
    #[tracing::instrument(skip(self, item), fields(id = %item.id, size = %item.size))]
    pub fn add_item(&mut self, item: NewItem) -> Result<(), CartError> {
        self.ensure_unlocked()?;
        self.merge(item, false);
        self.settle()
    }

    /// Add a batch of products with the same merge semantics as
    /// [`CartStore::add_item`]; the lock is checked once for the whole
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] during a lottery session, or a
    /// persistence error.
    #[tracing::instrument(skip(self, batch), fields(batch_len = batch.len()))]
    pub fn add_items(&mut self, batch: Vec<NewItem>) -> Result<(), CartError> {
        self.ensure_unlocked()?;

        for item in batch {
            self.merge(item, false);
        }

        self.settle()
    }

    /// Remove the exact `(id, size)` line; absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] during a lottery session, or a
    /// persistence error.
    pub fn remove_item(&mut self, id: &str, size: Size) -> Result<(), CartError> {
        self.ensure_unlocked()?;
        self.items.retain(|item| !item.matches(id, size));
        self.settle()
    }

    /// Set a line's quantity. A quantity below one removes the line.
    ///
    /// The requested millilitres (`quantity × size`) are validated against
    /// this line's cached stock ceiling only; volumes held in other sizes
    /// of the same product are not aggregated. Prize lines have no quantity
    /// controls and are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] during a lottery session,
    /// [`CartError::InsufficientStock`] when the request exceeds the cached
    /// ceiling (quantity unchanged), or a persistence error.
    #[tracing::instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        id: &str,
        size: Size,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.ensure_unlocked()?;

        if quantity < 1 {
            self.items.retain(|item| !item.matches(id, size));
            return self.settle();
        }

        let Some(line) = self
            .items
            .iter_mut()
            .find(|item| item.matches(id, size) && !item.is_prize)
        else {
            return Ok(());
        };

        if let (Some(ml), Some(stock_ml)) = (size.millilitres(), line.stock_ml) {
            let requested_ml = ml.saturating_mul(quantity);

            if requested_ml > stock_ml {
                return Err(CartError::InsufficientStock {
                    requested_ml,
                    stock_ml,
                });
            }
        }

        line.quantity = quantity;
        self.settle()
    }

    /// Empty the cart. Always allowed, even during a lottery session, which
    /// it deactivates.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.lottery.cancel();
        self.settle()
    }

    /// Apply a validated coupon; it persists until explicitly cleared.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub fn apply_coupon(&mut self, coupon: Coupon) -> Result<(), CartError> {
        debug!(code = %coupon.code, "coupon applied");
        self.coupon = Some(coupon);
        self.settle()
    }

    /// Drop the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub fn clear_coupon(&mut self) -> Result<(), CartError> {
        self.coupon = None;
        self.settle()
    }

    /// Hold a lucky prize against the cart.
    ///
    /// Item prizes materialise as a zero-price prize line. The raw subtotal
    /// must already meet the prize floor; falling below it later forfeits
    /// the prize automatically.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] during a lottery session,
    /// [`CartError::PrizeBelowMinimum`] when the subtotal is under the
    /// floor, or a persistence error.
    pub fn award_prize(&mut self, prize: LuckyPrize) -> Result<(), CartError> {
        self.ensure_unlocked()?;

        let subtotal = self.subtotal()?;

        if subtotal.to_minor_units() < self.config.prize_min_subtotal.to_minor_units() {
            return Err(CartError::PrizeBelowMinimum);
        }

        if let LuckyPrize::Item { id, size } = &prize {
            let currency = self.config.currency;

            self.merge(
                NewItem {
                    id: id.clone(),
                    size: *size,
                    unit_price: Money::from_minor(0, currency),
                    brand: String::new(),
                    category: String::new(),
                    stock_ml: None,
                },
                true,
            );
        }

        self.prize = Some(prize);
        self.settle()
    }

    /// Begin a lottery session: the supplied bundle replaces the entire
    /// cart (a hard replacement, not a merge) and the cart locks until the
    /// session expires or is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Locked`] when a session is already running, or
    /// a persistence error.
    #[tracing::instrument(skip(self, items), fields(bundle_len = items.len()))]
    pub fn start_lottery(&mut self, items: Vec<NewItem>, now: Timestamp) -> Result<(), CartError> {
        self.ensure_unlocked()?;

        self.items.clear();

        for item in items {
            self.merge(item, false);
        }

        for line in &mut self.items {
            line.is_lottery_item = true;
        }

        self.lottery = LotteryMode::start(now, self.config.lottery_duration);
        self.settle()
    }

    /// Forfeit the running lottery session and its bundle: the mode
    /// deactivates and the cart empties.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub fn cancel_lottery(&mut self) -> Result<(), CartError> {
        self.lottery.cancel();
        self.items.clear();
        self.settle()
    }

    /// Countdown tick. Expires the session when its time is up (the lock
    /// and discount end, the items stay) and deactivates it early if the
    /// cart emptied underneath it. Returns `true` when a session ended.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when clearing the lottery record.
    pub fn tick_lottery(&mut self, now: Timestamp) -> Result<bool, CartError> {
        if self.lottery.is_active() && self.items.is_empty() {
            self.lottery.cancel();
            self.storage.remove(LOTTERY_KEY)?;
            return Ok(true);
        }

        if self.lottery.expire_if_due(now) {
            debug!("lottery session expired");
            self.storage.remove(LOTTERY_KEY)?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Price the cart as of `now`. Expires a due lottery session first, then
    /// delegates to the pure evaluator; nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] on evaluator failure, or a persistence
    /// error from the expiry tick.
    pub fn quote(&mut self, now: Timestamp, email: Option<&str>) -> Result<Quote, CartError> {
        self.tick_lottery(now)?;

        Ok(pricing::evaluate(
            &self.items,
            self.coupon.as_ref(),
            email,
            self.prize.as_ref(),
            &self.lottery,
            &self.config,
        )?)
    }

    /// Reset the session after a submitted order: lines, prize and lottery
    /// end; the coupon stays applied, as it survives everything short of an
    /// explicit clear.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub fn complete_checkout(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.prize = None;
        self.lottery.cancel();
        self.settle()
    }

    fn ensure_unlocked(&self) -> Result<(), CartError> {
        if self.lottery.is_active() {
            return Err(CartError::Locked);
        }

        Ok(())
    }

    /// Merge a snapshot into the lines, keeping the `(id, size)` invariant.
    fn merge(&mut self, item: NewItem, is_prize: bool) {
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.matches(&item.id, item.size))
        {
            line.quantity = line.quantity.saturating_add(1);
            line.brand = item.brand;
            line.category = item.category;
            line.stock_ml = item.stock_ml;
            return;
        }

        self.items.push(LineItem {
            id: item.id,
            size: item.size,
            unit_price: item.unit_price,
            quantity: 1,
            is_prize,
            is_lottery_item: false,
            brand: item.brand,
            category: item.category,
            stock_ml: item.stock_ml,
        });
    }

    /// Post-mutation bookkeeping: the empty-cart lottery guard, the prize
    /// floor, persistence, and the settled-change notification.
    fn settle(&mut self) -> Result<(), CartError> {
        if self.lottery.is_active() && self.items.is_empty() {
            self.lottery.cancel();
        }

        self.enforce_prize_floor()?;
        self.persist()?;

        if let Some(listener) = &self.listener {
            listener.cart_changed(&self.items);
        }

        Ok(())
    }

    /// Forfeit the held prize and drop prize lines when the raw subtotal
    /// falls below the configured floor.
    fn enforce_prize_floor(&mut self) -> Result<(), CartError> {
        if self.prize.is_none() && !self.items.iter().any(|item| item.is_prize) {
            return Ok(());
        }

        let subtotal = self.subtotal()?;

        if subtotal.to_minor_units() < self.config.prize_min_subtotal.to_minor_units() {
            if self.prize.take().is_some() {
                debug!("prize forfeited: subtotal fell below the floor");
            }

            self.items.retain(|item| !item.is_prize);
        }

        Ok(())
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let record = CartRecord {
            items: self.items.iter().map(LineItemRecord::from_item).collect(),
            prize: self.prize.clone(),
        };

        self.storage
            .put(CART_KEY, &serde_json::to_string(&record)?)?;

        match &self.coupon {
            Some(coupon) => {
                self.storage
                    .put(COUPON_KEY, &serde_json::to_string(coupon)?)?;
            }
            None => self.storage.remove(COUPON_KEY)?,
        }

        match LotteryRecord::from_mode(&self.lottery) {
            Some(record) => {
                self.storage
                    .put(LOTTERY_KEY, &serde_json::to_string(&record)?)?;
            }
            None => self.storage.remove(LOTTERY_KEY)?,
        }

        Ok(())
    }

    fn hydrate(&mut self, now: Timestamp) {
        if let Some(raw) = self.read_record(CART_KEY) {
            match serde_json::from_str::<CartRecord>(&raw) {
                Ok(record) => {
                    let currency = self.config.currency;

                    self.items = record
                        .items
                        .into_iter()
                        .map(|item| item.into_item(currency))
                        .collect();
                    self.prize = record.prize;
                }
                Err(error) => warn!(%error, "discarding corrupt cart record"),
            }
        }

        if let Some(raw) = self.read_record(COUPON_KEY) {
            match serde_json::from_str::<Coupon>(&raw) {
                Ok(coupon) => self.coupon = Some(coupon),
                Err(error) => warn!(%error, "discarding corrupt coupon record"),
            }
        }

        if let Some(raw) = self.read_record(LOTTERY_KEY) {
            match serde_json::from_str::<LotteryRecord>(&raw) {
                Ok(record) => {
                    let mut mode = record.into_mode();

                    if mode.expire_if_due(now) || self.items.is_empty() {
                        mode = LotteryMode::Inactive;

                        if let Err(error) = self.storage.remove(LOTTERY_KEY) {
                            warn!(%error, "failed to clear stale lottery record");
                        }
                    }

                    self.lottery = mode;
                }
                Err(error) => warn!(%error, "discarding corrupt lottery record"),
            }
        }
    }

    fn read_record(&mut self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, key, "failed to read persisted record");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use rusty_money::iso::TWD;
    use testresult::TestResult;

    use crate::storage::MemoryStorage;

    use super::*;

    fn snapshot(id: &str, size: Size, price_major: i64) -> NewItem {
        NewItem {
            id: id.to_string(),
            size,
            unit_price: Money::from_major(price_major, TWD),
            brand: "Maison Noir".to_string(),
            category: "woody".to_string(),
            stock_ml: Some(100),
        }
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::new(MemoryStorage::new(), PricingConfig::default())
    }

    fn now() -> Result<Timestamp, jiff::Error> {
        "2025-06-01T12:00:00Z".parse()
    }

    #[test]
    fn repeated_adds_merge_into_one_line() -> TestResult {
        let mut store = store();

        for _ in 0..3 {
            store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        }

        assert_eq!(store.items().len(), 1);

        let line = store.items().first().ok_or("missing line")?;

        assert_eq!(line.quantity, 3);

        Ok(())
    }

    #[test]
    fn merge_refreshes_metadata_but_keeps_the_snapshotted_price() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;

        let mut updated = snapshot("p-1", Size::Ml(10), 180);
        updated.brand = "Renamed House".to_string();
        updated.stock_ml = Some(80);

        store.add_item(updated)?;

        let line = store.items().first().ok_or("missing line")?;

        assert_eq!(line.unit_price, Money::from_major(150, TWD));
        assert_eq!(line.brand, "Renamed House");
        assert_eq!(line.stock_ml, Some(80));

        Ok(())
    }

    #[test]
    fn different_sizes_are_distinct_lines() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.add_item(snapshot("p-1", Size::Ml(30), 350))?;

        assert_eq!(store.items().len(), 2);

        Ok(())
    }

    #[test]
    fn batch_add_uses_merge_semantics() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.add_items(vec![
            snapshot("p-1", Size::Ml(10), 150),
            snapshot("p-2", Size::Set, 890),
        ])?;

        assert_eq!(store.items().len(), 2);
        assert_eq!(
            store.items().first().ok_or("missing line")?.quantity,
            2
        );

        Ok(())
    }

    #[test]
    fn update_quantity_below_one_removes_the_line() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.update_quantity("p-1", Size::Ml(10), 0)?;

        assert!(store.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_validates_against_the_cached_stock_ceiling() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;

        // 11 * 10ml exceeds the 100ml ceiling.
        let result = store.update_quantity("p-1", Size::Ml(10), 11);

        assert!(matches!(
            result,
            Err(CartError::InsufficientStock {
                requested_ml: 110,
                stock_ml: 100,
            })
        ));
        assert_eq!(store.items().first().ok_or("missing line")?.quantity, 1);

        store.update_quantity("p-1", Size::Ml(10), 10)?;
        assert_eq!(store.items().first().ok_or("missing line")?.quantity, 10);

        Ok(())
    }

    #[test]
    fn lottery_locks_every_mutation_except_clearing() -> TestResult {
        let mut store = store();
        let now = now()?;

        store.start_lottery(vec![snapshot("l-1", Size::Ml(10), 990)], now)?;

        assert!(matches!(
            store.add_item(snapshot("p-1", Size::Ml(10), 150)),
            Err(CartError::Locked)
        ));
        assert!(matches!(
            store.remove_item("l-1", Size::Ml(10)),
            Err(CartError::Locked)
        ));
        assert!(matches!(
            store.update_quantity("l-1", Size::Ml(10), 2),
            Err(CartError::Locked)
        ));
        assert_eq!(store.items().len(), 1);

        store.clear()?;

        assert!(store.is_empty());
        assert!(!store.lottery().is_active());

        Ok(())
    }

    #[test]
    fn start_lottery_replaces_the_cart_and_tags_the_bundle() -> TestResult {
        let mut store = store();
        let now = now()?;

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.start_lottery(
            vec![
                snapshot("l-1", Size::Ml(10), 500),
                snapshot("l-2", Size::Ml(5), 490),
            ],
            now,
        )?;

        assert_eq!(store.items().len(), 2);
        assert!(store.items().iter().all(|line| line.is_lottery_item));
        assert!(store.lottery().is_active());

        Ok(())
    }

    #[test]
    fn cancelling_the_lottery_forfeits_the_bundle() -> TestResult {
        let mut store = store();

        store.start_lottery(vec![snapshot("l-1", Size::Ml(10), 990)], now()?)?;
        store.cancel_lottery()?;

        assert!(store.is_empty());
        assert!(!store.lottery().is_active());

        Ok(())
    }

    #[test]
    fn expiry_ends_the_lock_but_keeps_the_items() -> TestResult {
        let mut store = store();
        let now = now()?;

        store.start_lottery(vec![snapshot("l-1", Size::Ml(10), 990)], now)?;

        let later = now.saturating_add(jiff::Span::new().minutes(11))?;

        assert!(store.tick_lottery(later)?);
        assert!(!store.lottery().is_active());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.storage().get(LOTTERY_KEY)?, None);

        // The cart is mutable again.
        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;

        Ok(())
    }

    #[test]
    fn award_prize_requires_the_subtotal_floor() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 500))?;

        let result = store.award_prize(LuckyPrize::Discount {
            value: Decimal::new(1, 1),
        });

        assert!(matches!(result, Err(CartError::PrizeBelowMinimum)));
        assert_eq!(store.prize(), None);

        Ok(())
    }

    #[test]
    fn dropping_below_the_floor_forfeits_the_prize_and_its_lines() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 1500))?;
        store.award_prize(LuckyPrize::Item {
            id: "prize-10".to_string(),
            size: Size::Ml(10),
        })?;

        assert!(store.prize().is_some());
        assert_eq!(store.items().len(), 2);

        // Shrinking the cart below 1200 forfeits both the prize and its line.
        store.remove_item("p-1", Size::Ml(10))?;

        assert_eq!(store.prize(), None);
        assert!(store.is_empty());

        Ok(())
    }

    #[test]
    fn session_round_trips_through_storage() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.add_item(snapshot("p-2", Size::Set, 890))?;
        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.apply_coupon(Coupon {
            code: "TEN".to_string(),
            discount_percent: 10,
            limitations: None,
        })?;

        let reloaded = CartStore::load(
            store.storage().clone(),
            PricingConfig::default(),
            now()?,
        );

        assert_eq!(reloaded.items(), store.items());
        assert_eq!(reloaded.coupon(), store.coupon());

        Ok(())
    }

    #[test]
    fn corrupt_records_hydrate_as_empty_state() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.put(CART_KEY, "{not json")?;
        storage.put(COUPON_KEY, "[]")?;

        let store = CartStore::load(storage, PricingConfig::default(), now()?);

        assert!(store.is_empty());
        assert_eq!(store.coupon(), None);

        Ok(())
    }

    #[test]
    fn stale_persisted_lottery_is_discarded_on_load() -> TestResult {
        let mut store = store();
        let started = now()?;

        store.start_lottery(vec![snapshot("l-1", Size::Ml(10), 990)], started)?;

        let reloaded = CartStore::load(
            store.storage().clone(),
            PricingConfig::default(),
            started.saturating_add(jiff::Span::new().minutes(30))?,
        );

        assert!(!reloaded.lottery().is_active());
        assert_eq!(reloaded.items().len(), 1);

        Ok(())
    }

    #[test]
    fn quote_reflects_the_live_session() -> TestResult {
        let mut store = store();
        let now = now()?;

        store.add_item(snapshot("p-1", Size::Ml(10), 600))?;
        store.add_item(snapshot("p-2", Size::Ml(30), 400))?;
        store.apply_coupon(Coupon {
            code: "TEN".to_string(),
            discount_percent: 10,
            limitations: None,
        })?;

        let quote = store.quote(now, None)?;

        assert_eq!(quote.subtotal, Money::from_major(1000, TWD));
        assert_eq!(quote.discount_amount, Money::from_major(100, TWD));
        assert_eq!(quote.total, Money::from_major(960, TWD));
        assert_eq!(quote.free_samples, 6);

        Ok(())
    }

    #[test]
    fn checkout_resets_everything_but_the_coupon() -> TestResult {
        let mut store = store();

        store.add_item(snapshot("p-1", Size::Ml(10), 1500))?;
        store.apply_coupon(Coupon {
            code: "TEN".to_string(),
            discount_percent: 10,
            limitations: None,
        })?;
        store.award_prize(LuckyPrize::Discount {
            value: Decimal::new(1, 1),
        })?;

        store.complete_checkout()?;

        assert!(store.is_empty());
        assert_eq!(store.prize(), None);
        assert!(!store.lottery().is_active());
        assert!(store.coupon().is_some());

        Ok(())
    }

    struct CountingListener {
        calls: AtomicUsize,
    }

    impl CartChangeListener for CountingListener {
        fn cart_changed(&self, _items: &[LineItem]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn listener_hears_every_settled_mutation() -> TestResult {
        let listener = Arc::new(CountingListener {
            calls: AtomicUsize::new(0),
        });

        let mut store = CartStore::new(MemoryStorage::new(), PricingConfig::default())
            .with_listener(Arc::clone(&listener) as Arc<dyn CartChangeListener>);

        store.add_item(snapshot("p-1", Size::Ml(10), 150))?;
        store.update_quantity("p-1", Size::Ml(10), 2)?;
        store.remove_item("p-1", Size::Ml(10))?;

        assert_eq!(listener.calls.load(Ordering::SeqCst), 3);

        Ok(())
    }
}
