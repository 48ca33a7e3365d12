//! CLI definition, logging setup and the interactive trading menu.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_state_adapter::JsonStateAdapter;
use crate::domain::engine::{self, TradeReceipt};
use crate::domain::error::TraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::registry::AssetRegistry;
use crate::domain::settings::{validate_starting_balance, Settings};
use crate::ports::quote_port::PriceQuoteGateway;
use crate::ports::state_port::{LoadReport, StatePort};

#[derive(Parser, Debug)]
#[command(name = "cointrader", about = "Paper-trade cryptocurrencies against live prices")]
pub struct Cli {
    /// INI config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// JSON file used by save and load
    #[arg(short, long)]
    pub state_file: Option<PathBuf>,
    /// Starting cash balance in USD
    #[arg(short, long)]
    pub balance: Option<f64>,
    /// Skip the price refresh at startup
    #[arg(long)]
    pub offline: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();

    let settings = match resolve_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let gateway = match build_gateway(&settings) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let store = Box::new(JsonStateAdapter::new(settings.state_file.clone()));
    let mut session = Session::new(&settings, gateway, store);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let startup = if cli.offline {
        Ok(())
    } else {
        session.refresh(&mut out)
    };
    let result = startup.and_then(|()| session.run_menu(stdin.lock(), &mut out));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: terminal I/O failed: {e}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// Config file values, then command-line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, TraderError> {
    let mut settings = match &cli.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            Settings::from_config(&FileConfigAdapter::from_file(path)?)?
        }
        None => Settings::default(),
    };

    if let Some(balance) = cli.balance {
        validate_starting_balance(balance)?;
        settings.starting_balance = balance;
    }
    if let Some(path) = &cli.state_file {
        settings.state_file = path.clone();
    }
    Ok(settings)
}

#[cfg(feature = "coingecko")]
fn build_gateway(settings: &Settings) -> Result<Box<dyn PriceQuoteGateway>, TraderError> {
    use crate::adapters::coingecko_adapter::CoinGeckoAdapter;
    Ok(Box::new(CoinGeckoAdapter::new(&settings.quotes)?))
}

#[cfg(not(feature = "coingecko"))]
fn build_gateway(_settings: &Settings) -> Result<Box<dyn PriceQuoteGateway>, TraderError> {
    Ok(Box::new(NoQuoteSource))
}

/// Gateway used when no quote backend is compiled in.
#[cfg(not(feature = "coingecko"))]
struct NoQuoteSource;

#[cfg(not(feature = "coingecko"))]
impl PriceQuoteGateway for NoQuoteSource {
    fn fetch_quotes(
        &self,
        _symbols: &[&str],
    ) -> Result<crate::domain::registry::QuoteMap, TraderError> {
        Err(TraderError::TransportFailure {
            reason: "coingecko feature is required for live prices".into(),
        })
    }
}

const MENU: &str = "\
=== Crypto Trader ===
1. Show prices
2. Buy
3. Sell
4. Show portfolio
5. Show price history
6. Save
7. Load
8. Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ShowPrices,
    Buy,
    Sell,
    ShowPortfolio,
    ShowHistory,
    Save,
    Load,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::ShowPrices),
            "2" => Some(MenuChoice::Buy),
            "3" => Some(MenuChoice::Sell),
            "4" => Some(MenuChoice::ShowPortfolio),
            "5" => Some(MenuChoice::ShowHistory),
            "6" => Some(MenuChoice::Save),
            "7" => Some(MenuChoice::Load),
            "8" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Formats a quote with enough precision for sub-dollar coins.
pub fn format_price(price: f64) -> String {
    if price != 0.0 && price.abs() < 1.0 {
        format!("${price:.6}")
    } else {
        format!("${price:.2}")
    }
}

/// Owns the portfolio and registry for one run of the program.
pub struct Session {
    pub portfolio: Portfolio,
    pub registry: AssetRegistry,
    gateway: Box<dyn PriceQuoteGateway>,
    store: Box<dyn StatePort>,
    min_refresh_interval: Duration,
    last_refresh: Option<Instant>,
}

impl Session {
    pub fn new(
        settings: &Settings,
        gateway: Box<dyn PriceQuoteGateway>,
        store: Box<dyn StatePort>,
    ) -> Self {
        Session {
            portfolio: Portfolio::new(settings.starting_balance),
            registry: AssetRegistry::new(),
            gateway,
            store,
            min_refresh_interval: settings.quotes.min_refresh_interval,
            last_refresh: None,
        }
    }

    /// Refresh prices unless the last refresh is too recent.
    pub fn refresh<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if let Some(at) = self.last_refresh {
            if at.elapsed() < self.min_refresh_interval {
                writeln!(out, "Using cached prices (refreshed {}s ago)", at.elapsed().as_secs())?;
                return Ok(());
            }
        }

        match engine::refresh_prices(&mut self.registry, self.gateway.as_ref()) {
            Ok(report) => {
                self.last_refresh = Some(Instant::now());
                for failure in &report.failures {
                    writeln!(out, "warning: {failure}")?;
                }
                writeln!(out, "Updated {} of {} prices", report.updated.len(), self.registry.assets().len())?;
            }
            Err(e) => writeln!(out, "error: {e}")?,
        }
        Ok(())
    }

    pub fn show_prices<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for asset in self.registry.assets() {
            if asset.is_priced() {
                writeln!(out, "{:<10} {}", asset.name, format_price(asset.current_price))?;
            } else {
                writeln!(out, "{:<10} n/a", asset.name)?;
            }
        }
        Ok(())
    }

    pub fn show_portfolio<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Cash balance: ${:.2}", self.portfolio.cash_balance())?;
        let positions = engine::position_values(&self.portfolio, &self.registry);
        if positions.is_empty() {
            writeln!(out, "No holdings")?;
        }
        for p in positions {
            writeln!(
                out,
                "{:<10} {:>14} @ {:>14} = ${:.2}",
                p.asset,
                p.quantity,
                format_price(p.price),
                p.market_value
            )?;
        }
        writeln!(
            out,
            "Total value: ${:.2}",
            engine::valuation(&self.portfolio, &self.registry)
        )
    }

    pub fn show_history<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for asset in self.registry.assets() {
            let samples: Vec<String> = asset
                .price_history
                .iter()
                .map(|p| format_price(*p))
                .collect();
            writeln!(out, "{:<10} [{}]", asset.name, samples.join(", "))?;
        }
        Ok(())
    }

    /// Buy by user-typed asset name, matched case-insensitively.
    pub fn buy(&mut self, name: &str, quantity: f64) -> Result<TradeReceipt, TraderError> {
        let asset = self.resolve(name)?;
        engine::buy(&mut self.portfolio, &self.registry, &asset, quantity)
    }

    pub fn sell(&mut self, name: &str, quantity: f64) -> Result<TradeReceipt, TraderError> {
        let asset = self.resolve(name)?;
        engine::sell(&mut self.portfolio, &self.registry, &asset, quantity)
    }

    fn resolve(&self, name: &str) -> Result<String, TraderError> {
        self.registry
            .canonical_name(name)
            .map(str::to_string)
            .ok_or_else(|| TraderError::UnknownAsset {
                name: name.trim().to_string(),
            })
    }

    pub fn save(&self) -> Result<(), TraderError> {
        self.store.save(&self.portfolio, &self.registry)
    }

    pub fn load(&mut self) -> Result<LoadReport, TraderError> {
        self.store.load(&mut self.portfolio, &mut self.registry)
    }

    /// Run the menu until the exit choice or end of input.
    pub fn run_menu<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        loop {
            writeln!(out, "{MENU}")?;
            let Some(line) = prompt(&mut input, out, "Choice: ")? else {
                return Ok(());
            };
            let Some(choice) = MenuChoice::parse(&line) else {
                writeln!(out, "error: unknown choice '{}'", line.trim())?;
                continue;
            };

            match choice {
                MenuChoice::ShowPrices => {
                    self.refresh(out)?;
                    self.show_prices(out)?;
                }
                MenuChoice::Buy | MenuChoice::Sell => {
                    let Some((name, quantity)) = read_order(&mut input, out)? else {
                        continue;
                    };
                    let asset = match self.resolve(&name) {
                        Ok(asset) => asset,
                        Err(e) => {
                            writeln!(out, "error: {e}")?;
                            continue;
                        }
                    };
                    // Unpriced assets skip the quote; the engine reports them.
                    let quoted = self
                        .registry
                        .get(&asset)
                        .filter(|a| a.is_priced())
                        .map(|a| a.current_price);
                    if let Some(price) = quoted {
                        writeln!(
                            out,
                            "{} {quantity} {asset} at {} for ${:.2}?",
                            if choice == MenuChoice::Buy { "Buy" } else { "Sell" },
                            format_price(price),
                            quantity * price
                        )?;
                        match confirm(&mut input, out)? {
                            None => return Ok(()),
                            Some(true) => {}
                            Some(false) => continue,
                        }
                    }
                    let result = if choice == MenuChoice::Buy {
                        self.buy(&asset, quantity)
                    } else {
                        self.sell(&asset, quantity)
                    };
                    match result {
                        Ok(r) => writeln!(
                            out,
                            "{} {} {} at {} for ${:.2}; balance ${:.2}",
                            if choice == MenuChoice::Buy { "Bought" } else { "Sold" },
                            r.quantity,
                            r.asset,
                            format_price(r.price),
                            r.amount,
                            r.balance_after
                        )?,
                        Err(e) => writeln!(out, "error: {e}")?,
                    }
                }
                MenuChoice::ShowPortfolio => self.show_portfolio(out)?,
                MenuChoice::ShowHistory => self.show_history(out)?,
                MenuChoice::Save => match self.save() {
                    Ok(()) => writeln!(out, "Saved")?,
                    Err(e) => writeln!(out, "error: {e}")?,
                },
                MenuChoice::Load => match self.load() {
                    Ok(report) => {
                        for name in &report.ignored {
                            writeln!(out, "warning: ignored unknown asset {name}")?;
                        }
                        writeln!(out, "Loaded")?
                    }
                    Err(e) => writeln!(out, "error: {e}")?,
                },
                MenuChoice::Exit => {
                    writeln!(out, "Goodbye")?;
                    return Ok(());
                }
            }
        }
    }
}

/// Print `label` and read one line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `Some(true)` only for `y`; `n` cancels and anything else is an error.
fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<Option<bool>> {
    let Some(answer) = prompt(input, out, "Confirm (y/n): ")? else {
        return Ok(None);
    };
    match answer.to_ascii_lowercase().as_str() {
        "y" => Ok(Some(true)),
        "n" => {
            writeln!(out, "Cancelled")?;
            Ok(Some(false))
        }
        _ => {
            writeln!(out, "error: expected 'y' or 'n', got '{answer}'; order cancelled")?;
            Ok(Some(false))
        }
    }
}

fn read_order<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<Option<(String, f64)>> {
    let Some(name) = prompt(input, out, "Asset: ")? else {
        return Ok(None);
    };
    let Some(raw) = prompt(input, out, "Quantity: ")? else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(quantity) => Ok(Some((name, quantity))),
        Err(_) => {
            writeln!(out, "error: '{raw}' is not a number")?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_choice_parse() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::ShowPrices));
        assert_eq!(MenuChoice::parse(" 8\n"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("buy"), None);
    }

    #[test]
    fn format_price_precision() {
        assert_eq!(format_price(67000.5), "$67000.50");
        assert_eq!(format_price(0.123456789), "$0.123457");
        assert_eq!(format_price(0.0), "$0.00");
    }

    #[test]
    fn resolve_settings_flags_override_defaults() {
        let cli = Cli::parse_from(["cointrader", "--balance", "500", "--state-file", "x.json"]);
        let settings = resolve_settings(&cli).unwrap();
        assert_eq!(settings.starting_balance, 500.0);
        assert_eq!(settings.state_file, PathBuf::from("x.json"));
    }

    #[test]
    fn resolve_settings_rejects_negative_balance_flag() {
        let cli = Cli::parse_from(["cointrader", "--balance=-1"]);
        assert!(matches!(
            resolve_settings(&cli),
            Err(TraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn resolve_settings_missing_config_file() {
        let cli = Cli::parse_from(["cointrader", "--config", "/nonexistent/trader.ini"]);
        let err = resolve_settings(&cli).unwrap_err();
        assert!(matches!(err, TraderError::ConfigParse { .. }));
    }
}
