pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL,
    category TEXT NOT NULL,
    image_url TEXT NOT NULL DEFAULT '',
    home_url TEXT NOT NULL DEFAULT '',
    create_time INTEGER,
    update_time INTEGER,
    links TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS billing_plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    plan_id TEXT NOT NULL DEFAULT '',
    product_id INTEGER REFERENCES products(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    quantity_supported INTEGER NOT NULL DEFAULT 0,
    create_time INTEGER,
    update_time INTEGER,
    links TEXT NOT NULL DEFAULT '[]',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_billing_plans_plan_id ON billing_plans(plan_id);

CREATE TABLE IF NOT EXISTS amounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    currency_code TEXT NOT NULL,
    value REAL NOT NULL,
    UNIQUE (currency_code, value)
);

CREATE TABLE IF NOT EXISTS frequencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    interval_unit TEXT NOT NULL,
    interval_count INTEGER NOT NULL DEFAULT 1,
    UNIQUE (interval_unit, interval_count)
);

CREATE TABLE IF NOT EXISTS pricing_schemes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fixed_price_id INTEGER NOT NULL UNIQUE REFERENCES amounts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS payment_preferences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    billing_plan_id INTEGER NOT NULL UNIQUE REFERENCES billing_plans(id) ON DELETE CASCADE,
    auto_bill_outstanding INTEGER NOT NULL DEFAULT 1,
    setup_fee_id INTEGER NOT NULL REFERENCES amounts(id) ON DELETE CASCADE,
    setup_fee_failure_action TEXT NOT NULL,
    payment_failure_threshold INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS billing_cycles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    billing_plan_id INTEGER NOT NULL REFERENCES billing_plans(id) ON DELETE CASCADE,
    frequency_id INTEGER NOT NULL REFERENCES frequencies(id) ON DELETE CASCADE,
    pricing_scheme_id INTEGER REFERENCES pricing_schemes(id) ON DELETE CASCADE,
    tenure_type TEXT NOT NULL,
    sequence INTEGER NOT NULL DEFAULT 1,
    total_cycles INTEGER NOT NULL DEFAULT 0,
    UNIQUE (billing_plan_id, sequence)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subscription_id TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL,
    plan_id INTEGER NOT NULL REFERENCES billing_plans(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    start_time INTEGER NOT NULL,
    shipping_amount_id INTEGER REFERENCES amounts(id) ON DELETE CASCADE,
    billing_info TEXT NOT NULL DEFAULT '{}',
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL,
    links TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_subscriptions_user ON subscriptions(user_id);

CREATE TABLE IF NOT EXISTS subscribers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subscription_id INTEGER NOT NULL UNIQUE REFERENCES subscriptions(id) ON DELETE CASCADE,
    name TEXT NOT NULL DEFAULT '{}',
    email TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS paypal_profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    subscription_valid_till INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
