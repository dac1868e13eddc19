//! Catalog and back-office fixtures for tests. The demo catalog matches the
//! rows inserted by the `seed_catalog` migration; back-office accounts are
//! only created here or through `--bootstrap-admin`.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AdminCredentials, Customer, Order, OrderAggregate, OrderItem, OrderLine,
    OrderStatus, Role, Specifications, Weapon, WeaponCategory,
};

fn price(raw: &str) -> BigDecimal {
    BigDecimal::from_str(raw).unwrap_or_default()
}

pub fn category_fixture(name: &str) -> WeaponCategory {
    WeaponCategory {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("Armamento de la categoría {}", name),
        created_at: Utc::now(),
    }
}

/// A weapon with no required documents in its own category.
pub fn weapon_fixture(name: &str, unit_price: &str, stock: i32) -> Weapon {
    Weapon {
        id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        name: name.to_string(),
        caliber: "9mm".to_string(),
        manufacturer: "Fabricante".to_string(),
        image_url: String::new(),
        description: String::new(),
        price: price(unit_price),
        stock,
        specifications: Specifications::default(),
        required_documents: Vec::new(),
        created_at: Utc::now(),
    }
}

pub fn admin_fixture(username: &str, password: &str, role: Role) -> AdminCredentials {
    AdminCredentials::new(username, username, role, password)
}

/// A pending order holding `quantity` units of each weapon.
pub fn aggregate_fixture(lines: Vec<(Weapon, i32)>) -> OrderAggregate {
    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        full_name: "Cliente de Prueba".to_string(),
        dni: "12345678".to_string(),
        email: "cliente@example.pe".to_string(),
        phone: "987654321".to_string(),
        address: "Av. Brasil 100, Lima".to_string(),
        created_at: now,
    };
    let order_id = Uuid::new_v4();
    let order_items: Vec<OrderLine> = lines
        .into_iter()
        .map(|(weapon, quantity)| {
            let subtotal = &weapon.price * BigDecimal::from(quantity);
            OrderLine {
                item: OrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    weapon_id: weapon.id,
                    quantity,
                    unit_price: weapon.price.clone(),
                    subtotal,
                    created_at: now,
                },
                weapon: Some(weapon),
            }
        })
        .collect();
    let total_amount = order_items
        .iter()
        .fold(BigDecimal::from(0), |sum, line| sum + &line.item.subtotal);

    OrderAggregate {
        order: Order {
            id: order_id,
            order_number: format!("SUCAMEC-{}-TEST0", now.timestamp_millis()),
            customer_id: customer.id,
            status: OrderStatus::Pendiente,
            total_amount,
            notes: String::new(),
            documents_validated: false,
            stock_validated: false,
            documents_validator_id: None,
            stock_validator_id: None,
            created_at: now,
            updated_at: now,
        },
        customer: Some(customer),
        order_items,
        order_documents: Vec::new(),
    }
}

pub struct DemoCatalog {
    pub categories: Vec<WeaponCategory>,
    pub weapons: Vec<Weapon>,
    pub admins: Vec<AdminCredentials>,
}

pub fn demo_catalog() -> DemoCatalog {
    let pistols = category_fixture("Pistolas");
    let rifles = category_fixture("Rifles");
    let shotguns = category_fixture("Escopetas");

    let general = ["DNI vigente", "Certificado psicológico", "Certificado médico"];
    let documents = |extra: &str| -> Vec<String> {
        general
            .iter()
            .copied()
            .chain(std::iter::once(extra))
            .map(String::from)
            .collect()
    };

    let weapon = |category: &WeaponCategory,
                  name: &str,
                  caliber: &str,
                  manufacturer: &str,
                  unit_price: &str,
                  stock: i32,
                  license: &str,
                  specifications: Specifications| Weapon {
        id: Uuid::new_v4(),
        category_id: category.id,
        name: name.to_string(),
        caliber: caliber.to_string(),
        manufacturer: manufacturer.to_string(),
        image_url: String::new(),
        description: format!("{} {} calibre {}", manufacturer, name, caliber),
        price: price(unit_price),
        stock,
        specifications,
        required_documents: documents(license),
        created_at: Utc::now(),
    };

    let weapons = vec![
        weapon(
            &pistols,
            "Glock 17",
            "9mm",
            "Glock",
            "2850.00",
            12,
            "Licencia SUCAMEC Tipo C",
            Specifications {
                peso: Some("625 g".to_string()),
                capacidad: Some("17 cartuchos".to_string()),
                longitud: Some("202 mm".to_string()),
            },
        ),
        weapon(
            &pistols,
            "Beretta 92FS",
            "9mm",
            "Beretta",
            "3200.00",
            6,
            "Licencia SUCAMEC Tipo A",
            Specifications {
                peso: Some("945 g".to_string()),
                capacidad: Some("15 cartuchos".to_string()),
                longitud: Some("217 mm".to_string()),
            },
        ),
        weapon(
            &rifles,
            "FN FAL",
            "7.62x51mm",
            "FN Herstal",
            "12500.00",
            3,
            "Licencia SUCAMEC Tipo B",
            Specifications {
                peso: Some("4.3 kg".to_string()),
                capacidad: Some("20 cartuchos".to_string()),
                longitud: Some("1090 mm".to_string()),
            },
        ),
        weapon(
            &shotguns,
            "Mossberg 500",
            "12 GA",
            "Mossberg",
            "2100.00",
            8,
            "Licencia SUCAMEC Tipo C",
            Specifications {
                peso: Some("3.4 kg".to_string()),
                capacidad: Some("6 cartuchos".to_string()),
                longitud: None,
            },
        ),
    ];

    let mut admin = admin_fixture("admin", "admin123", Role::Administrator);
    admin.user.full_name = "Administrador SUCAMEC".to_string();
    let mut logistic = admin_fixture("logistica", "logistica123", Role::Logistic);
    logistic.user.full_name = "Encargado de Logística".to_string();

    DemoCatalog {
        categories: vec![pistols, rifles, shotguns],
        weapons,
        admins: vec![admin, logistic],
    }
}
