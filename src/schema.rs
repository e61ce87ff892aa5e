//! Database schema definitions
//!
//! Table and column names for the analytical store, plus the DDL used when a
//! table is replaced. Every table is dropped and recreated on each ingestion
//! run, so there is no migration history.

/// Customers table schema
pub mod customers {
    /// Table name
    pub const TABLE: &str = "customers";
    /// Customer identifier column
    pub const CUSTOMER_ID: &str = "customer_id";
    /// Title-cased name column
    pub const CUSTOMER_NAME: &str = "customer_name";

    /// Table definition
    pub const DDL: &str = "CREATE TABLE customers (
        customer_id TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        city TEXT,
        province TEXT,
        postal_code TEXT,
        country TEXT,
        customer_code TEXT,
        points_balance REAL NOT NULL,
        note TEXT,
        first_visit TEXT,
        last_visit TEXT,
        total_visits INTEGER NOT NULL,
        total_spent REAL NOT NULL
    )";

    /// Insert statement matching [`DDL`] column order
    pub const INSERT: &str = "INSERT INTO customers (
        customer_id, customer_name, email, phone, address, city, province,
        postal_code, country, customer_code, points_balance, note,
        first_visit, last_visit, total_visits, total_spent
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";
}

/// Receipts table schema
pub mod receipts {
    /// Table name
    pub const TABLE: &str = "receipts";
    /// Sale timestamp column
    pub const TIMESTAMP: &str = "timestamp";
    /// Receipt number column
    pub const RECEIPT_ID: &str = "receipt_id";

    /// Table definition
    pub const DDL: &str = "CREATE TABLE receipts (
        timestamp TEXT NOT NULL,
        receipt_id TEXT NOT NULL,
        receipt_type TEXT NOT NULL,
        gross_sales REAL NOT NULL,
        discounts REAL NOT NULL,
        total_collected REAL NOT NULL,
        payment_type TEXT,
        description TEXT NOT NULL,
        cashier_name TEXT NOT NULL,
        customer_name TEXT,
        status TEXT NOT NULL,
        n_wash INTEGER NOT NULL,
        n_dry INTEGER NOT NULL,
        n_fold INTEGER NOT NULL,
        n_detergent INTEGER NOT NULL,
        n_fabcon INTEGER NOT NULL,
        n_bleach INTEGER NOT NULL,
        is_titan INTEGER NOT NULL,
        is_full_load INTEGER NOT NULL,
        has_extra INTEGER NOT NULL
    )";

    /// Insert statement matching [`DDL`] column order
    pub const INSERT: &str = "INSERT INTO receipts (
        timestamp, receipt_id, receipt_type, gross_sales, discounts,
        total_collected, payment_type, description, cashier_name,
        customer_name, status, n_wash, n_dry, n_fold, n_detergent, n_fabcon,
        n_bleach, is_titan, is_full_load, has_extra
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)";
}

/// Expenses table schema
pub mod expenses {
    /// Table name
    pub const TABLE: &str = "expenses";
    /// Item name column; rows where it is NULL are hidden from analytics
    pub const ITEM_NAME: &str = "item_name";

    /// Table definition
    pub const DDL: &str = "CREATE TABLE expenses (
        date TEXT,
        item_name TEXT,
        note TEXT,
        category TEXT,
        subcategory TEXT,
        quantity INTEGER NOT NULL,
        unit_cost REAL NOT NULL,
        total_cost REAL NOT NULL
    )";

    /// Insert statement matching [`DDL`] column order
    pub const INSERT: &str = "INSERT INTO expenses (
        date, item_name, note, category, subcategory, quantity, unit_cost, total_cost
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
}

/// Item catalog table schema
pub mod items {
    /// Table name
    pub const TABLE: &str = "items";
    /// Item name column
    pub const NAME: &str = "name";

    /// Table definition
    pub const DDL: &str = "CREATE TABLE items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        cost REAL NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )";

    /// Insert statement; `id` is assigned by SQLite
    pub const INSERT: &str = "INSERT INTO items (
        name, category, cost, created_at, updated_at, deleted_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
}

/// Every table the loader manages
pub const ALL_TABLES: [&str; 4] = [customers::TABLE, receipts::TABLE, expenses::TABLE, items::TABLE];
