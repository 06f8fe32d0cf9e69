table! {
    articles (id) {
        id -> Int4,
        title -> Text,
        body -> Text,
        like_count -> Int4,
        created_at -> Timestamp,
    }
}

table! {
    bookmarks (id) {
        id -> Int4,
        user_id -> Int4,
        article_id -> Int4,
        created_at -> Timestamp,
        modified_at -> Timestamp,
    }
}

table! {
    likes (id) {
        id -> Int4,
        user_id -> Int4,
        article_id -> Int4,
        created_at -> Timestamp,
        modified_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        email -> Text,
        user_name -> Varchar,
        img_url -> Nullable<Text>,
        introduction -> Nullable<Text>,
        is_open -> Bool,
        bookmark_count -> Int4,
        like_count -> Int4,
        subscribe_count -> Int4,
    }
}

joinable!(bookmarks -> articles (article_id));
joinable!(bookmarks -> users (user_id));
joinable!(likes -> articles (article_id));
joinable!(likes -> users (user_id));

allow_tables_to_appear_in_same_query!(articles, bookmarks, likes, users);
