//! # Recibo CLI
//!
//! Command-line utility for driving receipt printers over Bluetooth SPP
//! or USB.
//!
//! ## Usage
//!
//! ```bash
//! # List reachable printers
//! recibo discover
//! recibo discover --json
//!
//! # Connection status for a target
//! recibo status --usb 1:4
//!
//! # Print text
//! recibo print --usb 1:4 "Hello from recibo"
//! recibo print --bluetooth 00:11:22:33:44:55 --size 48 --center --bold "CORNER CAFE"
//!
//! # Print a QR code, cut, kick the drawer, feed paper
//! recibo qr --usb 1:4 "https://example.com/r/1234"
//! recibo cut --usb 1:4
//! recibo drawer --usb 1:4
//! recibo feed --usb 1:4 --lines 3
//!
//! # Print a demo receipt exercising the whole surface
//! recibo demo --usb 1:4
//! ```
//!
//! There is no embedded vendor engine on desktop hosts, so the CLI always
//! drives the byte transports.

use clap::{Args, Parser, Subcommand};

use recibo::{
    connection::ConnectTarget,
    engine::NullProvider,
    error::PrinterError,
    printer::Printer,
    protocol::columns::Column,
    protocol::Alignment,
};

/// Recibo - receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "recibo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit machine-readable JSON where the command produces output
    #[arg(long, global = true)]
    json: bool,
}

/// Which printer to talk to
#[derive(Args, Debug)]
struct Target {
    /// Bluetooth printer MAC address (XX:XX:XX:XX:XX:XX)
    #[arg(long, value_name = "MAC", conflicts_with = "usb")]
    bluetooth: Option<String>,

    /// USB printer address (bus:device, as in lsusb)
    #[arg(long, value_name = "BUS:DEV")]
    usb: Option<String>,
}

impl Target {
    fn to_connect_target(&self) -> Result<ConnectTarget, PrinterError> {
        match (&self.bluetooth, &self.usb) {
            (Some(address), _) => Ok(ConnectTarget::Bluetooth {
                address: address.clone(),
            }),
            (_, Some(address)) => Ok(ConnectTarget::Usb {
                address: address.clone(),
            }),
            (None, None) => Err(PrinterError::DeviceNotFound(
                "no target given (use --bluetooth or --usb)".to_string(),
            )),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List reachable printers across all device classes
    Discover,

    /// Show connection status for a target
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Print a line of text
    Print {
        #[command(flatten)]
        target: Target,

        /// Text to print
        text: String,

        /// Font size in points (binned to the printer's size modes)
        #[arg(long, default_value = "24")]
        size: i32,

        /// Center the text
        #[arg(long)]
        center: bool,

        /// Print emphasized
        #[arg(long)]
        bold: bool,
    },

    /// Print a QR code
    Qr {
        #[command(flatten)]
        target: Target,

        /// Data to encode
        data: String,

        /// Module size in dots (1-16)
        #[arg(long, default_value = "6")]
        module_size: u8,
    },

    /// Feed past the tear bar and cut
    Cut {
        #[command(flatten)]
        target: Target,
    },

    /// Kick the cash drawer
    Drawer {
        #[command(flatten)]
        target: Target,
    },

    /// Feed blank lines
    Feed {
        #[command(flatten)]
        target: Target,

        /// Number of lines
        #[arg(long, default_value = "3")]
        lines: u8,
    },

    /// Print a demo receipt exercising the full command surface
    Demo {
        #[command(flatten)]
        target: Target,
    },
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), PrinterError> {
    let cli = Cli::parse();
    let mut printer = Printer::new(Box::new(NullProvider));

    match cli.command {
        Commands::Discover => {
            let devices = printer.discover();
            if cli.json {
                println!("{}", to_json(&devices)?);
            } else if devices.is_empty() {
                println!("No printers found.");
            } else {
                for device in devices {
                    let marker = if device.connected { "*" } else { " " };
                    println!(
                        "{} {:<10} {:<20} {}",
                        marker,
                        device.kind.label(),
                        device.address,
                        device.name
                    );
                }
            }
        }

        Commands::Status { target } => {
            // Status is only meaningful once connected
            printer.connect(&target.to_connect_target()?)?;
            let status = printer.get_status();
            if cli.json {
                println!("{}", to_json(&status)?);
            } else {
                println!("{}", status.message);
            }
            printer.disconnect();
        }

        Commands::Print {
            target,
            text,
            size,
            center,
            bold,
        } => {
            printer.connect(&target.to_connect_target()?)?;
            let alignment = if center { Alignment::Center } else { Alignment::Left };
            printer.print_text_styled(&format!("{}\n", text), size, alignment as i32, bold)?;
            printer.disconnect();
        }

        Commands::Qr { target, data, module_size } => {
            printer.connect(&target.to_connect_target()?)?;
            printer.print_qr_code(&data, module_size, Alignment::Center as i32)?;
            printer.disconnect();
        }

        Commands::Cut { target } => {
            printer.connect(&target.to_connect_target()?)?;
            printer.cut_paper()?;
            printer.disconnect();
        }

        Commands::Drawer { target } => {
            printer.connect(&target.to_connect_target()?)?;
            printer.open_drawer()?;
            printer.disconnect();
        }

        Commands::Feed { target, lines } => {
            printer.connect(&target.to_connect_target()?)?;
            printer.line_wrap(lines)?;
            printer.disconnect();
        }

        Commands::Demo { target } => {
            printer.connect(&target.to_connect_target()?)?;
            print_demo_receipt(&mut printer)?;
            printer.disconnect();
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PrinterError> {
    serde_json::to_string_pretty(value).map_err(|e| PrinterError::Io(std::io::Error::other(e)))
}

/// Demo receipt touching every dispatcher operation the wire supports
fn print_demo_receipt(printer: &mut Printer) -> Result<(), PrinterError> {
    printer.printer_init()?;

    printer.print_text_styled("CORNER CAFE\n", 48, Alignment::Center as i32, true)?;
    printer.print_text_styled("123 Example St\n", 24, Alignment::Center as i32, false)?;
    printer.line_wrap(1)?;

    printer.set_alignment(Alignment::Left as i32)?;
    printer.print_columns(&[
        Column::new("2x Flat White", 22, Alignment::Left),
        Column::new("$9.00", 10, Alignment::Right),
    ])?;
    printer.print_columns(&[
        Column::new("1x Croissant", 22, Alignment::Left),
        Column::new("$4.50", 10, Alignment::Right),
    ])?;
    printer.print_columns(&[
        Column::new("Total", 22, Alignment::Left),
        Column::new("$13.50", 10, Alignment::Right),
    ])?;
    printer.line_wrap(1)?;

    printer.print_text_with_font("Thank you!\n", 36)?;
    printer.print_qr_code("https://example.com/r/1234", 6, Alignment::Center as i32)?;
    printer.cut_paper()?;

    Ok(())
}
