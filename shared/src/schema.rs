diesel::table! {
    admin_users (id) {
        id -> Uuid,
        username -> Varchar,
        password_hash -> Varchar,
        role -> Varchar,
        full_name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        full_name -> Varchar,
        dni -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        address -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_documents (id) {
        id -> Uuid,
        order_id -> Uuid,
        document_type -> Varchar,
        file_url -> Varchar,
        file_name -> Varchar,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    order_items (id) {
        id -> Uuid,
        order_id -> Uuid,
        weapon_id -> Uuid,
        quantity -> Int4,
        unit_price -> Numeric,
        subtotal -> Numeric,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    order_validations (id) {
        id -> Uuid,
        order_id -> Uuid,
        admin_user_id -> Uuid,
        validation_type -> Varchar,
        status -> Varchar,
        notes -> Nullable<Text>,
        validated_at -> Timestamptz,
    }
}

diesel::table! {
    orders (id) {
        id -> Uuid,
        order_number -> Varchar,
        customer_id -> Uuid,
        status -> Varchar,
        total_amount -> Numeric,
        notes -> Text,
        documents_validated -> Bool,
        stock_validated -> Bool,
        documents_validator_id -> Nullable<Uuid>,
        stock_validator_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    weapon_categories (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    weapons (id) {
        id -> Uuid,
        category_id -> Uuid,
        name -> Varchar,
        caliber -> Varchar,
        manufacturer -> Varchar,
        image_url -> Varchar,
        description -> Text,
        price -> Numeric,
        stock -> Int4,
        specifications -> Jsonb,
        required_documents -> Array<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(order_documents -> orders (order_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_items -> weapons (weapon_id));
diesel::joinable!(order_validations -> admin_users (admin_user_id));
diesel::joinable!(order_validations -> orders (order_id));
diesel::joinable!(orders -> customers (customer_id));
diesel::joinable!(weapons -> weapon_categories (category_id));

diesel::allow_tables_to_appear_in_same_query!(
    admin_users,
    customers,
    order_documents,
    order_items,
    order_validations,
    orders,
    weapon_categories,
    weapons,
);
