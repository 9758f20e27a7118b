pub mod mercari_parser;
