//! Starter data written when a store opens on an empty slot.

use crate::model::collections::{DIETS, FEE_PACKAGES, MEMBERS, SUPPLEMENTS};
use crate::model::document::{fields_from, Fields};
use serde_json::json;

/// Returns `(collection, fields)` pairs in insertion order.
///
/// `now` is the RFC 3339 timestamp used for join/payment dates.
pub fn default_documents(now: &str) -> Vec<(&'static str, Fields)> {
    let mut documents = Vec::new();

    let members = [
        ("Krishna", "krishna@gym.com", "9876543210", "Male", 23, "01/01/2026", "monthly", 5000),
        ("Shivam", "shivam@gym.com", "9876543211", "Male", 25, "05/01/2026", "monthly", 5000),
        ("Jhanvi", "jhanvi@gym.com", "9876543212", "Female", 21, "08/01/2026", "monthly", 5000),
        ("Hardik", "hardik@gym.com", "9876543213", "Male", 27, "02/01/2026", "quarterly", 13500),
        ("Gunjan", "gunjan@gym.com", "9876543214", "Female", 24, "10/01/2026", "monthly", 5000),
    ];
    for (name, email, phone, gender, age, start, package, paid) in members {
        documents.push((
            MEMBERS,
            fields_from(json!({
                "name": name,
                "email": email,
                "phone": phone,
                "gender": gender,
                "age": age,
                "gymStartDate": start,
                "status": "active",
                "feePackage": package,
                "joinDate": now,
                "lastPayment": now,
                "totalPaid": paid,
            })),
        ));
    }

    let packages = [
        ("Monthly", "monthly", 5000, "1 Month", vec!["Gym Access", "Basic Equipment"]),
        (
            "Quarterly",
            "quarterly",
            13500,
            "3 Months",
            vec!["Gym Access", "All Equipment", "Personal Locker"],
        ),
        (
            "Annual",
            "annual",
            50000,
            "12 Months",
            vec![
                "Gym Access",
                "All Equipment",
                "Personal Locker",
                "Trainer Session",
                "Priority Support",
            ],
        ),
    ];
    for (name, key, price, label, features) in packages {
        documents.push((
            FEE_PACKAGES,
            fields_from(json!({
                "name": name,
                "key": key,
                "price": price,
                "duration": key,
                "durationLabel": label,
                "features": features,
                "isActive": true,
            })),
        ));
    }

    let supplements = [
        ("Protein Powder", 1500, "Whey isolate for post-workout recovery"),
        ("Whey Shake", 100, "Single-serve ready-to-drink shake"),
        ("Creatine", 800, "Creatine monohydrate for strength training"),
    ];
    for (name, price, description) in supplements {
        documents.push((
            SUPPLEMENTS,
            fields_from(json!({"name": name, "price": price, "description": description})),
        ));
    }

    let diets = [
        ("Weight Loss Plan", "Low carbs, high protein. ~1500 kcal/day."),
        ("Muscle Gain Plan", "High protein, calorie surplus. ~3000 kcal/day."),
        ("Balanced Diet", "Balanced macros for maintenance."),
    ];
    for (name, details) in diets {
        documents.push((DIETS, fields_from(json!({"name": name, "details": details}))));
    }

    documents
}
