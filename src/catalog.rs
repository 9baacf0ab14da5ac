//! Built-in category catalog.
//!
//! Categories are identified by name; expenses, templates and budget scopes
//! refer to them by that name.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub icon_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: &'static str,
    pub icon: &'static str,
    pub icon_type: &'static str,
    pub color: &'static str,
    pub group: &'static str,
}

const fn group(
    name: &'static str,
    description: &'static str,
    color: &'static str,
    icon: &'static str,
) -> CategoryGroup {
    CategoryGroup {
        name,
        description,
        color,
        icon,
        icon_type: "phosphor",
    }
}

const fn cat(
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    group: &'static str,
) -> Category {
    Category {
        name,
        icon,
        icon_type: "phosphor",
        color,
        group,
    }
}

static GROUPS: &[CategoryGroup] = &[
    group("Housing & Utilities", "Home-related expenses including rent, utilities, and maintenance", "#3B82F6", "house"),
    group("Transportation", "Vehicle and travel-related expenses", "#F59E0B", "car"),
    group("Food & Groceries", "Food, dining, and grocery expenses", "#10B981", "hamburger"),
    group("Health & Wellness", "Healthcare, fitness, and wellness expenses", "#EF4444", "heart"),
    group("Education & Personal Development", "Learning, courses, and educational expenses", "#8B5CF6", "book"),
    group("Bills & Subscriptions", "Recurring bills and subscription services", "#EC4899", "lightning"),
    group("Family & Children", "Family and child-related expenses", "#06B6D4", "baby"),
    group("Debt & Savings", "Loan payments, savings, and investments", "#84CC16", "currency-dollar"),
    group("Insurance", "Insurance premiums and coverage", "#6B7280", "shield"),
    group("Leisure & Entertainment", "Entertainment, hobbies, and leisure activities", "#F97316", "gamepad"),
    group("Shopping & Personal Care", "Personal shopping and care items", "#DB2777", "shopping-cart"),
];

static CATEGORIES: &[Category] = &[
    cat("Rent / Mortgage", "house", "#3B82F6", "Housing & Utilities"),
    cat("Electricity", "lightning", "#F59E0B", "Housing & Utilities"),
    cat("Water", "drop", "#06B6D4", "Housing & Utilities"),
    cat("Gas", "flame", "#F97316", "Housing & Utilities"),
    cat("Internet & Phone", "wifi-high", "#8B5CF6", "Housing & Utilities"),
    cat("Maintenance / Repairs", "wrench", "#6B7280", "Housing & Utilities"),
    cat("Fuel", "gas-pump", "#F59E0B", "Transportation"),
    cat("Public transport", "bus", "#10B981", "Transportation"),
    cat("Car loan / Lease", "currency-dollar", "#EF4444", "Transportation"),
    cat("Insurance", "shield", "#6B7280", "Transportation"),
    cat("Maintenance & Repairs", "gear", "#8B5CF6", "Transportation"),
    cat("Parking / Tolls", "parking", "#EC4899", "Transportation"),
    cat("Groceries", "shopping-cart", "#10B981", "Food & Groceries"),
    cat("Dining out / Takeaway", "fork-knife", "#F59E0B", "Food & Groceries"),
    cat("Coffee / Snacks", "coffee", "#8B5CF6", "Food & Groceries"),
    cat("Health insurance", "shield-plus", "#EF4444", "Health & Wellness"),
    cat("Medical bills (doctor, dentist, etc.)", "stethoscope", "#F59E0B", "Health & Wellness"),
    cat("Pharmacy / Medicine", "pill", "#10B981", "Health & Wellness"),
    cat("Gym / Sports / Fitness", "barbell", "#8B5CF6", "Health & Wellness"),
    cat("Tuition fees", "graduation-cap", "#8B5CF6", "Education & Personal Development"),
    cat("Books & Materials", "book", "#10B981", "Education & Personal Development"),
    cat("Online courses / Subscriptions", "monitor-play", "#F59E0B", "Education & Personal Development"),
    cat("Training / Certifications", "certificate", "#EF4444", "Education & Personal Development"),
    cat("Streaming (Netflix, Spotify, etc.)", "play", "#EC4899", "Bills & Subscriptions"),
    cat("Cloud services", "cloud", "#06B6D4", "Bills & Subscriptions"),
    cat("Magazine / Membership fees", "newspaper", "#8B5CF6", "Bills & Subscriptions"),
    cat("Childcare / Babysitting", "baby", "#06B6D4", "Family & Children"),
    cat("School fees", "student", "#10B981", "Family & Children"),
    cat("Toys & Supplies", "teddy-bear", "#F59E0B", "Family & Children"),
    cat("Loan repayments", "bank", "#84CC16", "Debt & Savings"),
    cat("Credit card payments", "credit-card", "#EF4444", "Debt & Savings"),
    cat("Emergency fund", "piggy-bank", "#10B981", "Debt & Savings"),
    cat("Investments", "trending-up", "#8B5CF6", "Debt & Savings"),
    cat("Life insurance", "shield-check", "#6B7280", "Insurance"),
    cat("Health insurance (if not under Health group)", "shield-plus", "#EF4444", "Insurance"),
    cat("Property / Car insurance", "shield-warning", "#F59E0B", "Insurance"),
    cat("Travel / Holidays", "airplane", "#F97316", "Leisure & Entertainment"),
    cat("Movies / Concerts", "ticket", "#EC4899", "Leisure & Entertainment"),
    cat("Hobbies", "palette", "#8B5CF6", "Leisure & Entertainment"),
    cat("Games", "gamepad", "#10B981", "Leisure & Entertainment"),
    cat("Clothing & Accessories", "tshirt", "#DB2777", "Shopping & Personal Care"),
    cat("Personal Care", "drop-half-bottom", "#EC4899", "Shopping & Personal Care"),
];

pub fn groups() -> &'static [CategoryGroup] {
    GROUPS
}

pub fn categories() -> &'static [Category] {
    CATEGORIES
}

/// Look up a category by exact name.
pub fn find(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

pub fn exists(name: &str) -> bool {
    find(name).is_some()
}

pub fn categories_in_group(group: &str) -> impl Iterator<Item = &'static Category> + '_ {
    CATEGORIES.iter().filter(move |c| c.group == group)
}
