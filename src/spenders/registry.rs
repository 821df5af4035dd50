use alloy::primitives::{address, Address};
use std::collections::HashMap;
use std::str::FromStr;

use super::watchlist::{parse_watchlist_csv, WatchlistEntry};
use crate::chain::short_address;
use crate::config::SpenderConfig;
use crate::risk::classifier::TrustTier;

/// A spender the registry knows by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownSpender {
    pub name: String,
    pub tier: TrustTier,
}

/// Result of looking up a spender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpenderLookup {
    pub name: String,
    pub tier: TrustTier,
    /// No name is known and `name` is the shortened address.
    pub unresolved: bool,
}

const TRUSTED: &[(Address, &str)] = &[
    // Uniswap
    (address!("68b3465833fb72a70ecdf485e0e4c7bd8665fc45"), "Uniswap V3: Router 2"),
    (address!("e592427a0aece92de3edee1f18e0157c05861564"), "Uniswap V3: Router"),
    (address!("7a250d5630b4cf539739df2c5dacb4c659f2488d"), "Uniswap V2: Router"),
    (address!("000000000022d473030f116ddee9f6b43ac78ba3"), "Uniswap: Permit2"),
    (address!("ef1c6e67703c7bd7107eed8303fbe6ec2554bf6b"), "Uniswap: Universal Router"),
    (address!("3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad"), "Uniswap: Universal Router 2"),
    (address!("4c60051384bd2d3c01bfc845cf5f4b44bcbe9de5"), "Uniswap: Universal Router (Permit2)"),
    (address!("643770e279d5d0733f21d6dc03a8efbabf3255b4"), "Uniswap: Universal Router (Base)"),
    // Aggregators
    (address!("1111111254eeb25477b68fb85ed929f73a960582"), "1inch V5: Router"),
    (address!("1111111254fb6c44bac0bed2854e76f90643097d"), "1inch V4: Router"),
    (address!("11111112542d85b3ef69ae05771c2dccff4faa26"), "1inch V3: Router"),
    (address!("111111125421ca6dc452d289314280a0f8842a65"), "1inch V6: Router"),
    (address!("1111111254760f7ab3f16433eea9304126dcd199"), "1inch: Limit Order"),
    (address!("def171fe48cf0115b1d80b88dc8eab59176fee57"), "Paraswap: Augustus V6"),
    (address!("216b4b4ba9f3e719726886d34a177484278bfcae"), "Paraswap: V5 Router"),
    (address!("55b916ce078ea594c10a874ba67ecc3d62e29822"), "Paraswap: Token Transfer Proxy"),
    (address!("def1c0ded9bec7f1a1670819833240f027b25eff"), "0x: Exchange Proxy"),
    (address!("def1abe32c034e558cdd535791643c58a13acc10"), "0x: Exchange Proxy (Polygon)"),
    (address!("9008d19f58aabd9ed0d60971565aa8510560ab41"), "CoW Protocol: GPv2Settlement"),
    (address!("c92e8bdf79f0507f65a392b0ab4667716bfe0110"), "CoW Protocol: Vault Relayer"),
    (address!("6131b5fae19ea4f9d964eac0408e4408b66337b5"), "KyberSwap: Meta Aggregation Router"),
    (address!("617dee16b86534a5d792a4d7a62fb491b544111e"), "KyberSwap: Router"),
    (address!("cf5540fffcdc3d510b18bfca6d2b9987b0772559"), "ODOS: Router V2"),
    (address!("4e3288c9ca110bcc82bf38f09a7b425c095d92bf"), "ODOS: Router"),
    (address!("1231deb6f5749ef6ce6943a275a1d3e7486f4eae"), "LiFi: Diamond"),
    // DEXs
    (address!("d9e1ce17f2641f24ae83637ab66a2cca9c378b9f"), "SushiSwap: Router"),
    (address!("1b02da8cb0d097eb8d57a175b88c7d8b47997506"), "SushiSwap: Router (Multi)"),
    (address!("0bfbcf9fa4f9c56b0f40a671ad40e0805a091865"), "SushiSwap: RouteProcessor3"),
    (address!("544ba588efd839d2692fc31ea991cd39993c135f"), "SushiSwap: RouteProcessor4"),
    (address!("10ed43c718714eb63d5aa57b78b54704e256024e"), "PancakeSwap: Router V2"),
    (address!("13f4ea83d0bd40e75c8222255bc855a974568dd4"), "PancakeSwap: Smart Router"),
    (address!("1b81d678ffb9c0263b24a97847620c99d213eb14"), "PancakeSwap: Router V3"),
    (address!("99a58482bd75cbab83b27ec03ca68ff489b5788f"), "Curve: Router"),
    (address!("bebe5d8f8686e0d9d5fccc16a4db509a46a7a833"), "Curve: Router NG"),
    (address!("f0d4c12a5768d806021f80a262b4d39d26c58b8d"), "Curve: Deposit/Withdraw"),
    (address!("ba12222222228d8ba445958a75a0704d566bf2c8"), "Balancer: Vault"),
    (address!("ba12222222228d8ba445958a75a0704d566bf2c9"), "Balancer: Relayer"),
    (address!("a062ae8a9c5e11aaa026fc2670b0d65ccc8b2858"), "Velodrome: Router V2"),
    (address!("9c12939390052919af3155f41bf4160fd3666a6f"), "Velodrome: Router"),
    (address!("cf77a3ba9a5ca399b7c97c74d54e5b1beb874e43"), "Aerodrome: Router"),
    (address!("c873fecbd354f5a56e00e710b90ef4201db2448d"), "Camelot: Router V2"),
    (address!("b4315e873dbcf96ffd0acd8ea43f689d8c20fb30"), "TraderJoe: LB Router"),
    // NFT marketplaces
    (address!("1e0049783f008a0085193e00003d00cd54003c71"), "OpenSea: Seaport 1.4"),
    (address!("00000000000001ad428e4906ae43d8f9852d0dd6"), "OpenSea: Seaport 1.5"),
    (address!("00000000000000adc04c56bf30ac9d3c0aaf14dc"), "OpenSea: Seaport 1.6"),
    (address!("0000000000000068f116a894984e2db1123eb395"), "OpenSea: Seaport 1.6"),
    (address!("29469395eaf6f95920e59f858042f0e28d98a20b"), "Blur: Marketplace"),
    (address!("000000000000ad05ccc4f10045630fb830b95127"), "Blur: Blend"),
    (address!("b2ecfe4e4d61f8790bbb9de2d1259b9e2410cea5"), "Blur: Pool"),
    (address!("74312363e45dcaba76c59ec49a7aa8a65a67eed3"), "X2Y2: Exchange"),
    (address!("0000000000e655fae4d56241588680f86e3b2377"), "LooksRare: Exchange V2"),
    (address!("9757f2d2b135150bbeb65308d4a91804107cd8d6"), "Rarible: Exchange V2"),
    // Lending
    (address!("87870bca3f3fd6335c3f4ce8392d69350b4fa4e2"), "Aave V3: Pool"),
    (address!("7d2768de32b0b80b7a3454c06bdac94a69ddc7a9"), "Aave V2: Pool"),
    (address!("794a61358d6845594f94dc1db02a252b5b4814ad"), "Aave V3: Pool (Polygon)"),
    (address!("8dff5e27ea6b7ac08ebfdf9eb090f32ee9a30fcf"), "Aave V2: Pool (Polygon)"),
    (address!("a97684ead0e402dc232d5a977953df7ecbab3cdb"), "Aave V3: Pool Addresses Provider"),
    (address!("c3d688b66703497daa19211eedff47f25384cdc3"), "Compound V3: cUSDCv3"),
    (address!("a17581a9e3356d9a858b789d68b4d866e593ae94"), "Compound V3: cWETHv3"),
    (address!("3afdc9bca9213a35503b077a6072f3d0d5ab0d30"), "Compound: Comet"),
    (address!("bbbbbbbbbb9cc5e90e3b3af64bdaf62c37eeffcb"), "Morpho Blue"),
    (address!("777777c9898d384f785ee44acfe945efdff5f3e0"), "Morpho: Optimizer"),
    (address!("c13e21b648a5ee794902342038ff3adab66be987"), "Spark: Pool"),
    (address!("02c3ea4e34c0cbd694d2adfa2c690eecbc1793ee"), "Spark: Pool (Gnosis)"),
    (address!("2032b9a8e9f7e76768ca9271003d3e43e1616b1f"), "Radiant: Lending Pool"),
    // Bridges
    (address!("99c9fc46f92e8a1c0dec1b1747d010903e884be1"), "Optimism: Gateway"),
    (address!("4dbd4fc535ac27206064b68ffcf827b0a60bab3f"), "Arbitrum: Inbox"),
    (address!("8315177ab297ba92a06054ce80a67ed4dbd7ed3a"), "Arbitrum: Bridge"),
    (address!("3154cf16ccdb4c6d922629664174b904d80f2c35"), "Base: Bridge"),
    (address!("32400084c286cf3e17e7b677ea9583e60a000324"), "zkSync: Diamond"),
    (address!("abea9132b05a70803a4e85094fd0e1800777fbef"), "zkSync: Bridge"),
    (address!("d19d4b5d358258f05d7b411e21a1460d11b0876f"), "Linea: Bridge"),
    (address!("504a330327a089d8364c4ab3811ee26976d388ce"), "Scroll: Gateway"),
    (address!("3a23f943181408eac424116af7b7790c94cb97a5"), "Socket: Gateway"),
    (address!("c30141b657f4216252dc59af2e7cdb9d8792e1b0"), "Socket: Registry"),
    (address!("2796317b0ff8538f253012862c06787adfb8ceb6"), "Synapse: Bridge"),
    (address!("d5d61e9dfb6680cba8353988ba0337802811c2e1"), "Stargate: Router"),
    (address!("8731d54e9d02c286767d56ac03e8037c07e01e98"), "Stargate: Router V2"),
    (address!("0af91fa049a7e1894f480bfe5bba20142c6c29a9"), "Stargate: Pool"),
    (address!("5427fefa711eff984124bfbb1ab6fbf5e3da1820"), "Across: SpokePool V3"),
    (address!("e35e9842fceaca96570b734083f4a58e8f7c5f2a"), "Across: SpokePool"),
    (address!("ee327f889d5947c1dc1c92e5ddbe27a7902ae07f"), "Hop: Bonder"),
    (address!("3e4a3a4796d16c0cd582c382691998f7c06420b6"), "Hop: Bridge"),
    (address!("80c67432656d59144ceff962e8faf8926599bcf8"), "Orbiter: Bridge"),
    (address!("e4edb277e41dc89ab076a1f049f4a3efa700bce8"), "Orbiter: Router"),
    // Perps and account abstraction
    (address!("d5220b23e2392e1ff37e9a329d9261272b8b07dd"), "GMX: Vault"),
    (address!("489ee077994b6658eafa855c308275ead8097c4a"), "GMX: Router"),
    (address!("c8ee91a54287db53897056e12d9819156d3822fb"), "GMX V2: Exchange Router"),
    (address!("7c68c7866a64fa2160f78eeae12217ffbf871fa8"), "GMX V2: Deposit Vault"),
    (address!("5ff137d4b0fdcd49dca30c7cf57e578a026d2789"), "Account Abstraction: EntryPoint 0.6"),
    (address!("0000000071727de22e5e9d8baf0edac6f37da032"), "Account Abstraction: EntryPoint 0.7"),
    // Liquid staking
    (address!("ae7ab96520de3a18e5e111b5eaab095312d7fe84"), "Lido: stETH"),
    (address!("7f39c581f595b53c5cb19bd0b3f8da6c935e2ca0"), "Lido: wstETH"),
    (address!("889edc2edab5f40e902b864ad4d7ade8e412f9b1"), "Lido: Withdrawal Queue"),
    (address!("be9895146f7af43049ca1c1ae358b0541ea49704"), "Coinbase: cbETH"),
    (address!("a35b1b31ce002fbf2058d22f30f95d405200a15b"), "Stader: ETHx"),
    (address!("f951e335afb289353dc249e82926178eac7ded78"), "Swell: swETH"),
    (address!("ac3e018457b222d93114458476f3e3416abbe38f"), "Frax: sfrxETH"),
    (address!("a1290d69c65a6fe4df752f95823fae25cb99e5a7"), "RocketPool: rETH"),
    (address!("9d39a5de30e57443bff2a8307a4256c8797a3497"), "Stakewise: sETH2"),
    (address!("bf5495efe5db9ce00f80364c8b423567e58d2110"), "EtherFi: eETH"),
    (address!("cd5fe23c85820f7b72d0926fc9b05b43e359b7ee"), "EtherFi: weETH"),
    (address!("858646372cc42e1a627fce94aa7a7033e7cf075a"), "EigenLayer: Strategy Manager"),
    (address!("39053d51b77dc0d36036fc1fcc8cb819df8ef37a"), "EigenLayer: Delegation Manager"),
    // Wallet infrastructure
    (address!("881d40237659c251811cec9c364ef91dc08d300c"), "MetaMask: Swap Router"),
    (address!("74de5d4fcbf63e00296fd95d33236b9794016631"), "MetaMask: Swap Router V2"),
    (address!("ca11bde05977b3631167028862be2a173976ca11"), "Multicall3"),
    (address!("5ba1e12693dc8f9c48aad8770482f4739beed696"), "Multicall2"),
    // Yield and vaults
    (address!("a354f35829ae975e850e23e9615b11da1b3dc4de"), "Yearn: yvUSDC"),
    (address!("db25ca703181e7484a155dd612b06f57e12be5f0"), "Yearn: yETH"),
    (address!("8e5645e038b9fb95cd8b0beb7b2c51c9ca9e8f1d"), "Convex: Booster"),
    (address!("4e3fbd56cd56c3e72c1403e103b45db9da5b9d2b"), "Convex: CVX"),
    (address!("5a6a4d54456819380173272a5e8e9b9904bdf41b"), "Curve: MIM Pool"),
    (address!("d533a949740bb3306d119cc777fa900ba034cd52"), "Curve: CRV Token"),
    (address!("f650c3d88d12db855b8bf7d11be6c55a4e07dcc9"), "Compound: cUSDT"),
    (address!("39aa39c021dfbae8fac545936693ac917d5e7563"), "Compound: cUSDC"),
    (address!("4ddc2d193948926d02f9b1fe9e1daa0718270ed5"), "Compound: cETH"),
    (address!("c36442b4a4522e871399cd717abdd847ab11fe88"), "Uniswap V3: NonfungiblePositionManager"),
];

// Legitimate, but commonly abused by phishing front-ends.
const RELAYS: &[(Address, &str)] = &[
    (address!("a5f565650890fba1824ee0f21ebbbf660a179934"), "Relay: ApprovalProxyV3 (Verify Site!)"),
    (address!("2f0a5b80e0e1d49d5eea44fd73c7f29e5e7d0b2a"), "Relay: RouterV3 (Verify Site!)"),
    (address!("f70da97812cb96acdf810712aa562db8dfa3dbef"), "Relay: ApprovalProxy (Verify Site!)"),
];

const DRAINERS: &[(Address, &str)] = &[
    (address!("000000000000084e91743124a982076c59f10084"), "DRAINER: Pink Drainer"),
    (address!("0000000000000000000000000000000000001010"), "DRAINER: Inferno Drainer"),
    (address!("00000000000003441d59dde9a90bffb1cd3fabf1"), "DRAINER: Angel Drainer"),
    (address!("00000000009726632680fb29d3f7a9734e3010e2"), "DRAINER: Monkey Drainer"),
    (address!("0000000000ffe8b47b3e2130213b802212439497"), "SCAM: Fake Uniswap"),
    (address!("00000000000045166c45af0fc6e4cf31d9e14b9a"), "DRAINER: Venom Drainer"),
    (address!("0000000000a84d1a9b0063a910315c7ffa9cd248"), "DRAINER: Ace Drainer"),
];

/// Immutable spender trust table: built-in entries, then watchlist rows, then
/// config labels, later sources overriding earlier ones.
#[derive(Debug, Clone)]
pub struct SpenderRegistry {
    by_address: HashMap<Address, KnownSpender>,
}

impl SpenderRegistry {
    pub fn builtin() -> Self {
        let mut by_address = HashMap::new();
        let tables = [
            (TRUSTED, TrustTier::Trusted),
            (RELAYS, TrustTier::Unknown),
            (DRAINERS, TrustTier::Malicious),
        ];
        for (table, tier) in tables {
            for (address, name) in table {
                by_address.insert(
                    *address,
                    KnownSpender {
                        name: name.to_string(),
                        tier,
                    },
                );
            }
        }
        Self { by_address }
    }

    pub fn from_config(config: &SpenderConfig) -> eyre::Result<Self> {
        let mut registry = Self::builtin();

        if let Some(ref path) = config.watchlist_path {
            let entries = parse_watchlist_csv(path)?;
            registry.extend(entries);
        }

        let mut labels = Vec::with_capacity(config.labels.len());
        for label in &config.labels {
            let address = Address::from_str(&label.address)
                .map_err(|e| eyre::eyre!("Invalid spender label address '{}': {}", label.address, e))?;
            let tier = TrustTier::from_str(&label.tier)?;
            labels.push(WatchlistEntry {
                address,
                name: label.name.clone(),
                tier,
            });
        }
        registry.extend(labels);

        tracing::info!(spenders = registry.len(), "Spender registry initialized");
        Ok(registry)
    }

    fn extend(&mut self, entries: impl IntoIterator<Item = WatchlistEntry>) {
        for entry in entries {
            self.by_address.insert(
                entry.address,
                KnownSpender {
                    name: entry.name,
                    tier: entry.tier,
                },
            );
        }
    }

    pub fn get(&self, spender: &Address) -> Option<&KnownSpender> {
        self.by_address.get(spender)
    }

    /// Name and tier for a spender. Unlisted spenders are `Unknown` and named by
    /// their shortened address.
    pub fn lookup(&self, spender: &Address) -> SpenderLookup {
        match self.get(spender) {
            Some(known) => SpenderLookup {
                name: known.name.clone(),
                tier: known.tier,
                unresolved: false,
            },
            None => SpenderLookup {
                name: short_address(spender),
                tier: TrustTier::Unknown,
                unresolved: true,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpenderLabelConfig;

    #[test]
    fn test_builtin_tiers() {
        let registry = SpenderRegistry::builtin();

        let uniswap = registry.lookup(&address!("7a250d5630b4cf539739df2c5dacb4c659f2488d"));
        assert_eq!(uniswap.tier, TrustTier::Trusted);
        assert!(!uniswap.unresolved);

        let relay = registry.lookup(&address!("a5f565650890fba1824ee0f21ebbbf660a179934"));
        assert_eq!(relay.tier, TrustTier::Unknown);
        assert!(!relay.unresolved);

        let drainer = registry.lookup(&address!("000000000000084e91743124a982076c59f10084"));
        assert_eq!(drainer.tier, TrustTier::Malicious);
        assert_eq!(drainer.name, "DRAINER: Pink Drainer");
    }

    #[test]
    fn test_builtin_table_coverage() {
        let registry = SpenderRegistry::builtin();
        assert_eq!(registry.len(), 128);

        for (address, name) in [
            (address!("ba12222222228d8ba445958a75a0704d566bf2c9"), "Balancer: Relayer"),
            (address!("4c60051384bd2d3c01bfc845cf5f4b44bcbe9de5"), "Uniswap: Universal Router (Permit2)"),
            (address!("f650c3d88d12db855b8bf7d11be6c55a4e07dcc9"), "Compound: cUSDT"),
            (address!("e4edb277e41dc89ab076a1f049f4a3efa700bce8"), "Orbiter: Router"),
        ] {
            let lookup = registry.lookup(&address);
            assert_eq!(lookup.tier, TrustTier::Trusted);
            assert_eq!(lookup.name, name);
        }
    }

    #[test]
    fn test_unlisted_spender_is_unresolved_unknown() {
        let registry = SpenderRegistry::builtin();
        let lookup = registry.lookup(&address!("abcdef0000000000000000000000000000001234"));
        assert_eq!(lookup.tier, TrustTier::Unknown);
        assert!(lookup.unresolved);
        assert_eq!(lookup.name, "0xabcd...1234");
    }

    #[test]
    fn test_config_labels_override_builtins() {
        let config = SpenderConfig {
            watchlist_path: None,
            labels: vec![SpenderLabelConfig {
                address: "0x7a250d5630b4cf539739df2c5dacb4c659f2488d".to_string(),
                name: "Compromised Router".to_string(),
                tier: "malicious".to_string(),
            }],
        };
        let registry = SpenderRegistry::from_config(&config).unwrap();
        let lookup = registry.lookup(&address!("7a250d5630b4cf539739df2c5dacb4c659f2488d"));
        assert_eq!(lookup.tier, TrustTier::Malicious);
        assert_eq!(lookup.name, "Compromised Router");
    }

    #[test]
    fn test_bad_label_rejected() {
        let config = SpenderConfig {
            watchlist_path: None,
            labels: vec![SpenderLabelConfig {
                address: "0x7a25".to_string(),
                name: "Short".to_string(),
                tier: "trusted".to_string(),
            }],
        };
        assert!(SpenderRegistry::from_config(&config).is_err());
    }
}
