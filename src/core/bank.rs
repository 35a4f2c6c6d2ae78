//! Bank façade
//!
//! `Bank` wires the account ledger, the card repository, the audit log and a
//! clock together. Every public method is one transaction boundary:
//!
//! 1. Load the records involved
//! 2. Run rollover on the card, if any
//! 3. Mutate clones in memory; any error returns before anything is written
//! 4. Check the versions of every record about to be written, then save them
//! 5. Append one audit entry
//!
//! Reads that run rollover (`statement`, `cards_of`) persist its effect.
//!
//! Card operations write two records, the account first and then the card.
//! The stores have no multi-record transaction, so a failure between the two
//! saves keeps the account change and loses the card change.

use crate::config::BankConfig;
use crate::core::audit_log::AuditLog;
use crate::core::billing::{PaymentAllocation, PayoffQuote, PurchaseReceipt, RolloverOutcome};
use crate::core::clock::{Clock, SystemClock};
use crate::core::ledger::AccountLedger;
use crate::core::lending::LoanPayment;
use crate::core::policy::{reward_points_for, CARD_LIMIT_STEP, MAX_CARDS_PER_ACCOUNT};
use crate::core::stats::BankStats;
use crate::core::traits::{AuditStore, Repository};
use crate::io::{JsonAuditFile, JsonFileStore};
use crate::types::{
    Account, AuditAction, AuditEntry, BankError, CardSummary, CreditCard, Holding, Investment,
    InvestmentId, InvestmentKind, Loan, LoanId, Statement, TransactionEntry,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Bank backed by the JSON files of a data directory
pub type FileBank<C = SystemClock> =
    Bank<JsonFileStore<Account>, JsonFileStore<CreditCard>, JsonAuditFile, C>;

pub struct Bank<A, K, L, C>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    ledger: AccountLedger<A>,
    cards: K,
    audit: AuditLog<L>,
    clock: C,
}

impl<C: Clock> Bank<JsonFileStore<Account>, JsonFileStore<CreditCard>, JsonAuditFile, C> {
    /// Open the bank stored under `config.data_dir`
    ///
    /// Files are created lazily on the first write.
    pub fn open(config: &BankConfig, clock: C) -> Self {
        let strict = config.strict_records;
        Bank::new(
            JsonFileStore::new(config.accounts_path(), strict),
            JsonFileStore::new(config.cards_path(), strict),
            AuditLog::with_retention(
                JsonAuditFile::new(config.audit_path(), strict),
                config.audit_retention,
            ),
            clock,
        )
    }
}

impl<A, K, L, C> Bank<A, K, L, C>
where
    A: Repository<Account>,
    K: Repository<CreditCard>,
    L: AuditStore,
    C: Clock,
{
    pub fn new(accounts: A, cards: K, audit: AuditLog<L>, clock: C) -> Self {
        Bank {
            ledger: AccountLedger::new(accounts),
            cards,
            audit,
            clock,
        }
    }

    // ----- accounts -----

    pub fn open_account(&mut self, username: &str) -> Result<Account, BankError> {
        let now = self.clock.now();
        let account = self.ledger.open_account(username, now)?;

        self.audit.record(
            &account.username,
            AuditAction::AccountOpened,
            "Account opened",
            now,
        );
        info!(account = %account.username, "Account opened");
        Ok(account)
    }

    pub fn account(&self, username: &str) -> Result<Account, BankError> {
        self.ledger.get(username)
    }

    /// All accounts, sorted by username
    pub fn accounts(&self) -> Result<Vec<Account>, BankError> {
        self.ledger.all()
    }

    pub fn balance(&self, username: &str) -> Result<Decimal, BankError> {
        Ok(self.ledger.get(username)?.balance)
    }

    pub fn history(&self, username: &str) -> Result<Vec<TransactionEntry>, BankError> {
        self.ledger.history(username)
    }

    pub fn deposit(&mut self, username: &str, amount: Decimal) -> Result<Account, BankError> {
        let now = self.clock.now();
        let account = self.ledger.deposit(username, amount, now)?;

        self.audit.record(
            username,
            AuditAction::Deposit,
            &format!("Deposit of {amount:.2}"),
            now,
        );
        info!(account = username, %amount, balance = %account.balance, "Deposit");
        Ok(account)
    }

    pub fn withdraw(&mut self, username: &str, amount: Decimal) -> Result<Account, BankError> {
        let now = self.clock.now();
        let account = self.ledger.withdraw(username, amount, now)?;

        self.audit.record(
            username,
            AuditAction::Withdrawal,
            &format!("Withdrawal of {amount:.2}"),
            now,
        );
        info!(account = username, %amount, balance = %account.balance, "Withdrawal");
        Ok(account)
    }

    /// Move funds to another account, returning the updated sender
    pub fn transfer(&mut self, from: &str, to: &str, amount: Decimal) -> Result<Account, BankError> {
        let now = self.clock.now();
        let (sender, _) = self.ledger.transfer(from, to, amount, now)?;

        self.audit.record(
            from,
            AuditAction::Transfer,
            &format!("Transfer of {amount:.2} to {to}"),
            now,
        );
        info!(from, to, %amount, "Transfer");
        Ok(sender)
    }

    /// Exchange reward points for balance, returning the credited amount
    pub fn redeem_points(&mut self, username: &str, points: u64) -> Result<Decimal, BankError> {
        let now = self.clock.now();
        let value = self.ledger.redeem_points(username, points, now)?;

        self.audit.record(
            username,
            AuditAction::PointsRedeemed,
            &format!("Redeemed {points} points for {value:.2}"),
            now,
        );
        info!(account = username, points, %value, "Points redeemed");
        Ok(value)
    }

    // ----- cards -----

    fn cards_owned_by(&self, owner: &str) -> Result<Vec<CreditCard>, BankError> {
        let mut cards: Vec<CreditCard> = self
            .cards
            .load_all()?
            .into_iter()
            .filter(|c| c.owner == owner)
            .collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.number.cmp(&b.number)));
        Ok(cards)
    }

    fn new_card_number(&self) -> Result<String, BankError> {
        let mut rng = rand::thread_rng();
        loop {
            let number = format!("4000{:012}", rng.gen_range(0..1_000_000_000_000u64));
            if self.cards.load(&number)?.is_none() {
                return Ok(number);
            }
        }
    }

    /// Issue a new card to `owner`
    ///
    /// The limit grows with the number of cards already held: 1000 for the
    /// first, 2000 for the second, and so on.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the owner is unknown
    /// - `CardLimitReached` if the owner already holds the maximum
    pub fn issue_card(&mut self, owner: &str) -> Result<CreditCard, BankError> {
        self.ledger.get(owner)?;

        let held = self.cards_owned_by(owner)?.len();
        if held >= MAX_CARDS_PER_ACCOUNT {
            return Err(BankError::CardLimitReached {
                account: owner.to_string(),
                max: MAX_CARDS_PER_ACCOUNT,
            });
        }

        let now = self.clock.now();
        let limit = CARD_LIMIT_STEP * Decimal::from(held + 1);
        let number = self.new_card_number()?;
        let mut card = CreditCard::new(&number, owner, limit, now);
        self.cards.save(&number, &mut card)?;

        self.audit.record(
            owner,
            AuditAction::CardIssued,
            &format!("Card {number} issued with limit {limit:.2}"),
            now,
        );
        info!(account = owner, card = %number, %limit, "Card issued");
        Ok(card)
    }

    /// The owner's first card, issuing one if they hold none
    pub fn card_for(&mut self, owner: &str) -> Result<CreditCard, BankError> {
        match self.cards_owned_by(owner)?.into_iter().next() {
            Some(card) => Ok(card),
            None => self.issue_card(owner),
        }
    }

    /// Load a card and check its owner, without rollover
    pub fn card(&self, owner: &str, number: &str) -> Result<CreditCard, BankError> {
        let card = self
            .cards
            .load(number)?
            .ok_or_else(|| BankError::card_not_found(number))?;
        if card.owner != owner {
            return Err(BankError::not_card_owner(number, owner));
        }
        Ok(card)
    }

    /// Load an owned card and bring its bill up to date in memory
    fn rolled_card(&self, owner: &str, number: &str) -> Result<(CreditCard, RolloverOutcome), BankError> {
        let mut card = self.card(owner, number)?;
        let outcome = card.roll_over(self.clock.today());
        if !outcome.is_noop() {
            debug!(
                card = number,
                interest = %outcome.interest,
                moved = outcome.moved,
                bill = %card.current_bill,
                "Rollover applied"
            );
        }
        Ok((card, outcome))
    }

    /// Version-check both records, then save the account and the card
    fn commit_pair(&mut self, card: &mut CreditCard, account: &mut Account) -> Result<(), BankError> {
        let number = card.number.clone();
        self.cards.check_version(&number, card)?;
        self.ledger.check_version(account)?;
        self.ledger.commit(account)?;
        self.cards.save(&number, card)?;
        Ok(())
    }

    /// Summaries of the owner's cards, after rollover
    ///
    /// Persists the rollover, with the same repeated-interest effect as
    /// [`Bank::statement`].
    pub fn cards_of(&mut self, owner: &str) -> Result<Vec<CardSummary>, BankError> {
        let numbers: Vec<String> = self
            .cards_owned_by(owner)?
            .into_iter()
            .map(|c| c.number)
            .collect();

        let mut summaries = Vec::with_capacity(numbers.len());
        for number in numbers {
            let (mut card, outcome) = self.rolled_card(owner, &number)?;
            if !outcome.is_noop() {
                self.cards.save(&number, &mut card)?;
            }
            summaries.push(card.summary());
        }
        Ok(summaries)
    }

    /// Charge a purchase to a card
    ///
    /// Awards `floor(amount / 10)` reward points to the owner.
    ///
    /// # Errors
    ///
    /// - `CardNotFound` / `NotCardOwner`
    /// - `InvalidAmount`, `InvalidInstallmentCount`, `LimitExceeded` from the card
    pub fn make_purchase(
        &mut self,
        owner: &str,
        number: &str,
        amount: Decimal,
        count: u32,
        description: &str,
    ) -> Result<PurchaseReceipt, BankError> {
        let now = self.clock.now();
        let (mut card, _) = self.rolled_card(owner, number)?;
        let mut account = self.ledger.get(owner)?;

        let receipt = card.purchase(amount, count, description, self.clock.today())?;
        let points = reward_points_for(amount);
        account.award_points(points);

        self.commit_pair(&mut card, &mut account)?;

        self.audit.record(
            owner,
            AuditAction::CardPurchase,
            &format!("Purchase '{description}' of {amount:.2} in {count}x on card {number}"),
            now,
        );
        info!(
            account = owner,
            card = number,
            %amount,
            count,
            per_installment = %receipt.per_installment,
            points,
            "Card purchase"
        );
        Ok(receipt)
    }

    /// Pay part or all of a card's bill from the owner's balance
    ///
    /// # Errors
    ///
    /// - `CardNotFound` / `NotCardOwner`
    /// - `InvalidAmount`, `AmountExceedsBill` from the card
    /// - `InsufficientFunds` from the ledger
    pub fn pay_bill(
        &mut self,
        owner: &str,
        number: &str,
        amount: Decimal,
    ) -> Result<PaymentAllocation, BankError> {
        let now = self.clock.now();
        let (mut card, _) = self.rolled_card(owner, number)?;
        let mut account = self.ledger.get(owner)?;

        card.validate_payment(amount)?;
        account.debit(amount, &format!("CARD PAYMENT {number}"), now)?;
        let allocation = card.apply_payment(amount)?;

        self.commit_pair(&mut card, &mut account)?;

        self.audit.record(
            owner,
            AuditAction::BillPayment,
            &format!("Payment of {amount:.2} on card {number}"),
            now,
        );
        info!(
            account = owner,
            card = number,
            %amount,
            settled = allocation.settled.len(),
            bill = %card.current_bill,
            "Bill payment"
        );
        Ok(allocation)
    }

    /// Settle every outstanding obligation of a card at a 10% discount
    ///
    /// # Errors
    ///
    /// - `CardNotFound` / `NotCardOwner`
    /// - `NoDebtPending` if nothing is owed
    /// - `InsufficientFunds` if the balance cannot cover the payoff
    pub fn quit_total_debt(&mut self, owner: &str, number: &str) -> Result<PayoffQuote, BankError> {
        let now = self.clock.now();
        let (mut card, _) = self.rolled_card(owner, number)?;
        let mut account = self.ledger.get(owner)?;

        let quote = card.payoff_quote()?;
        account.debit(quote.payoff, &format!("CARD PAYOFF {number}"), now)?;
        card.settle_all();

        self.commit_pair(&mut card, &mut account)?;

        self.audit.record(
            owner,
            AuditAction::DebtPayoff,
            &format!(
                "Payoff of {:.2} settling {:.2} on card {number}",
                quote.payoff, quote.owed
            ),
            now,
        );
        info!(account = owner, card = number, owed = %quote.owed, payoff = %quote.payoff, "Debt payoff");
        Ok(quote)
    }

    /// Bill statement of a card; the rollover it runs is persisted
    ///
    /// Interest accrues over the whole span since installments last moved,
    /// so every statement read on a day when nothing falls due charges that
    /// span again. Two reads on the same day can return different bills.
    pub fn statement(&mut self, owner: &str, number: &str) -> Result<Statement, BankError> {
        let (mut card, outcome) = self.rolled_card(owner, number)?;
        if !outcome.is_noop() {
            self.cards.save(number, &mut card)?;
        }
        Ok(card.statement(self.clock.today()))
    }

    // ----- loans -----

    /// Take a loan; the principal is credited to the balance at once
    ///
    /// # Errors
    ///
    /// - `InvalidAmount`, `InvalidInstallmentCount`
    /// - `LoanNotEligible` / `LoanLimitExceeded` from the balance-based limit
    pub fn take_loan(
        &mut self,
        username: &str,
        amount: Decimal,
        installments: u32,
    ) -> Result<Loan, BankError> {
        let now = self.clock.now();
        let (_, loan) = self
            .ledger
            .update(username, |account| account.take_loan(amount, installments, now))?;

        self.audit.record(
            username,
            AuditAction::LoanTaken,
            &format!(
                "Loan #{} of {amount:.2} in {installments}x, {:.2} to repay",
                loan.id, loan.total
            ),
            now,
        );
        info!(
            account = username,
            loan = loan.id,
            %amount,
            installments,
            total = %loan.total,
            "Loan taken"
        );
        Ok(loan)
    }

    /// Active loans of an account
    pub fn loans(&self, username: &str) -> Result<Vec<Loan>, BankError> {
        Ok(self.ledger.get(username)?.active_loans().cloned().collect())
    }

    /// Pay the next installment of a loan from the balance
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if the loan is unknown or already repaid
    /// - `InsufficientFunds` from the ledger
    pub fn pay_loan_installment(
        &mut self,
        username: &str,
        loan: LoanId,
    ) -> Result<LoanPayment, BankError> {
        let now = self.clock.now();
        let (_, payment) = self
            .ledger
            .update(username, |account| account.pay_loan_installment(loan, now))?;

        self.audit.record(
            username,
            AuditAction::LoanInstallmentPaid,
            &format!("Installment of {:.2} on loan #{loan}", payment.amount),
            now,
        );
        info!(
            account = username,
            loan,
            amount = %payment.amount,
            outstanding = %payment.outstanding,
            paid_off = payment.paid_off,
            "Loan installment paid"
        );
        Ok(payment)
    }

    /// Repay everything still owed on a loan
    ///
    /// # Errors
    ///
    /// - `LoanNotFound` if the loan is unknown or already repaid
    /// - `InsufficientFunds` from the ledger
    pub fn pay_off_loan(&mut self, username: &str, loan: LoanId) -> Result<LoanPayment, BankError> {
        let now = self.clock.now();
        let (_, payment) = self
            .ledger
            .update(username, |account| account.pay_off_loan(loan, now))?;

        self.audit.record(
            username,
            AuditAction::LoanPaidOff,
            &format!("Loan #{loan} paid off with {:.2}", payment.amount),
            now,
        );
        info!(account = username, loan, amount = %payment.amount, "Loan paid off");
        Ok(payment)
    }

    // ----- investments -----

    /// Move funds from the balance into a new investment
    pub fn invest(
        &mut self,
        username: &str,
        kind: InvestmentKind,
        amount: Decimal,
    ) -> Result<Investment, BankError> {
        let now = self.clock.now();
        let (_, investment) = self
            .ledger
            .update(username, |account| account.invest(kind, amount, now))?;

        self.audit.record(
            username,
            AuditAction::InvestmentMade,
            &format!("Investment #{} of {amount:.2} in {kind}", investment.id),
            now,
        );
        info!(account = username, investment = investment.id, %kind, %amount, "Investment made");
        Ok(investment)
    }

    /// Open investments of an account, valued now
    pub fn portfolio(&self, username: &str) -> Result<Vec<Holding>, BankError> {
        Ok(self.ledger.get(username)?.portfolio(self.clock.now()))
    }

    /// Close an investment and credit its current value
    ///
    /// # Errors
    ///
    /// `InvestmentNotFound` if the account holds no open investment with this id.
    pub fn redeem_investment(
        &mut self,
        username: &str,
        investment: InvestmentId,
    ) -> Result<Holding, BankError> {
        let now = self.clock.now();
        let (_, holding) = self
            .ledger
            .update(username, |account| account.redeem_investment(investment, now))?;

        self.audit.record(
            username,
            AuditAction::InvestmentRedeemed,
            &format!(
                "Redeemed investment #{investment} ({}) for {:.2}",
                holding.investment.kind, holding.value
            ),
            now,
        );
        info!(
            account = username,
            investment,
            value = %holding.value,
            earnings = %holding.earnings,
            "Investment redeemed"
        );
        Ok(holding)
    }

    // ----- admin -----

    /// Bank-wide totals over every account
    pub fn stats(&self) -> Result<BankStats, BankError> {
        let accounts = self.ledger.all()?;
        Ok(BankStats::from_accounts(&accounts, self.clock.now()))
    }

    // ----- audit -----

    /// Up to `limit` audit entries, newest first
    pub fn audit_entries(&self, account: Option<&str>, limit: usize) -> Vec<AuditEntry> {
        self.audit.recent(account, limit)
    }
}
