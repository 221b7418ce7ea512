use rust_decimal::Decimal;

/// The fixed menu the eatery serves. Enforcing that incoming food items
/// belong to this list is the NLU platform's job; the list exists here for
/// the new-order instructional message and the seeded price table.
pub const MENU_ITEMS: [&str; 9] = [
    "Pav Bhaji",
    "Chole Bhature",
    "Pizza",
    "Mango Lassi",
    "Masala Dosa",
    "Biryani",
    "Vada Pav",
    "Rava Dosa",
    "Samosa",
];

/// List price for a menu item, in currency units. Matches the seed rows in
/// the `food_items` migration; item lookup is case-insensitive.
pub fn list_price(item: &str) -> Option<Decimal> {
    let cents = match item.trim().to_ascii_lowercase().as_str() {
        "pav bhaji" => 600,
        "chole bhature" => 700,
        "pizza" => 850,
        "mango lassi" => 500,
        "masala dosa" => 600,
        "biryani" => 900,
        "vada pav" => 400,
        "rava dosa" => 700,
        "samosa" => 100,
        _ => return None,
    };
    Some(Decimal::new(cents, 2))
}

/// Instructional message returned by the new-order transition. Enumerates
/// every supported menu item.
pub fn start_order_message() -> String {
    let (last, head) = MENU_ITEMS.split_last().unwrap_or((&"", &[]));
    format!(
        "Ok, starting a new order. You can say things like \"I want two pizzas and one mango \
         lassi\". Make sure to specify a quantity for every food item! Also, we have only the \
         following items on our menu: {}, and {last}.",
        head.join(", ")
    )
}
