pub mod bucket_server;
