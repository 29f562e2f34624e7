diesel::table! {
    book (id) {
        id -> BigInt,
        title -> Text,
        genre -> Nullable<Text>,
        publishing_date_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    publishing_date (id) {
        id -> BigInt,
        date -> Date,
    }
}

diesel::joinable!(book -> publishing_date (publishing_date_id));

diesel::allow_tables_to_appear_in_same_query!(
    book,
    publishing_date,
);
