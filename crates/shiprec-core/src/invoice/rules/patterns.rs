//! Line grammars and helper patterns for carrier invoices.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Despatch line: "Despatch Packet (0-1kg)  1,234  2.09  S  2,579.06"
    pub static ref DESPATCH_LINE: Regex = Regex::new(
        r"(?x)
        ^(?P<description>.*?)\s+                  # free text up to the first fixed token
        (?P<quantity>\d{1,3}(?:,\d{3})*)\s+       # 12 or 1,234
        (?P<unit_price>\d+\.\d{2})\s+             # 2.09
        (?P<tax_code>[A-Z]?)\s*                   # S, O, X ... or blank
        (?P<net_cost>\d{1,3}(?:,\d{3})*\.\d{2})$  # 2,679.83
        "
    ).unwrap();

    // Shipment line: "123456789012 01/08/2024 International Priority 2 3.5 kg 4.50 1.20 5.70"
    pub static ref SHIPMENT_LINE: Regex = Regex::new(
        r"(?x)
        ^(?P<shipment>\d{12})\s+                  # 12-digit shipment number
        (?P<ship_date>\d{2}/\d{2}/\d{4})\s+       # dd/mm/yyyy
        (?P<service>[A-Za-z\ ]+)\s+               # service name
        (?P<pieces>\d+)\s+
        (?P<weight_kg>\d+(?:\.\d+)?\s*kg)\s+      # 3.5 kg
        (?P<reference>[A-Za-z\-]+)?\s*            # optional reference, may touch the amount
        (?P<taxable>\d+\.\d{2})\s+
        (?P<non_taxable>\d+\.\d{2})\s+
        (?P<total>\d+\.\d{2})$
        "
    ).unwrap();

    // Period token inside a despatch description
    pub static ref WEEK_TOKEN: Regex = Regex::new(r"WK(\d{1,2})").unwrap();

    // Everything from the first " (" on, trimmed off despatch descriptions
    pub static ref PARENTHETICAL_TAIL: Regex = Regex::new(r"\s\(.*").unwrap();

    // A "y" glued to a digit by ligature extraction
    pub static ref DIGIT_Y_ARTIFACT: Regex = Regex::new(r"(\d)y").unwrap();

    // Weight unit suffix
    pub static ref WEIGHT_SUFFIX: Regex = Regex::new(r"\s*kg$").unwrap();
}
